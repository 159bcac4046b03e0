use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed resource instance, `type:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: String,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

impl FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((entity_type, id)) if !entity_type.is_empty() && !id.is_empty() => {
                Ok(Entity::new(entity_type, id))
            }
            _ => Err(format!("expected `type:id`, got `{s}`")),
        }
    }
}

/// The principal side of a relationship or check, `type:id#relation`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "type")]
    pub subject_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relation: String,
}

impl Subject {
    pub fn new(subject_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            subject_type: subject_type.into(),
            id: id.into(),
            relation: String::new(),
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.id)?;
        if !self.relation.is_empty() {
            write!(f, "#{}", self.relation)?;
        }
        Ok(())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (reference, relation) = match s.split_once('#') {
            Some((reference, relation)) => (reference, relation),
            None => (s, ""),
        };
        let entity: Entity = reference
            .parse()
            .map_err(|_| format!("expected `type:id[#relation]`, got `{s}`"))?;
        Ok(Subject::new(entity.entity_type, entity.id).with_relation(relation))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectReference {
    #[serde(rename = "type")]
    pub subject_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    pub entity: Entity,
    pub relation: String,
    pub subject: Subject,
}

impl Tuple {
    pub fn new(entity: Entity, relation: impl Into<String>, subject: Subject) -> Self {
        Self {
            entity,
            relation: relation.into(),
            subject,
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.entity, self.relation, self.subject)
    }
}

/// Parses `entity:id#relation@subject:id[#relation]`.
impl FromStr for Tuple {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("expected `type:id#relation@type:id[#relation]`, got `{s}`");

        let (object, subject) = s.split_once('@').ok_or_else(invalid)?;
        let (entity, relation) = object.split_once('#').ok_or_else(invalid)?;
        if relation.is_empty() {
            return Err(invalid());
        }

        let entity: Entity = entity.parse().map_err(|_| invalid())?;
        let subject: Subject = subject.parse().map_err(|_| invalid())?;
        Ok(Tuple::new(entity, relation, subject))
    }
}

/// Attribute values travel as protobuf `Any` JSON (`{"@type": ..., "data": ...}`), kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub entity: Entity,
    pub attribute: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFilter {
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

impl EntityFilter {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ids: Vec::new(),
        }
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectFilter {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub subject_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleFilter {
    pub entity: EntityFilter,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectFilter>,
}

impl TupleFilter {
    pub fn for_entity(entity: EntityFilter) -> Self {
        Self {
            entity,
            ..Self::default()
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    pub fn with_subject(mut self, subject: SubjectFilter) -> Self {
        self.subject = Some(subject);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub entity: EntityFilter,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

/// Contextual data sent along with permission queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionContext {
    #[serde(default)]
    pub tuples: Vec<Tuple>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl PermissionContext {
    pub fn from_data(data: Map<String, Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_parses_relationship_notation() {
        let tuple: Tuple = "organization:1#member@team:7#owner".parse().unwrap();

        assert_eq!(tuple.entity, Entity::new("organization", "1"));
        assert_eq!(tuple.relation, "member");
        assert_eq!(tuple.subject, Subject::new("team", "7").with_relation("owner"));
        assert_eq!(tuple.to_string(), "organization:1#member@team:7#owner");

        assert!("organization:1@user:1".parse::<Tuple>().is_err());
        assert!("organization:1#@user:1".parse::<Tuple>().is_err());
        assert!("organization:1#member".parse::<Tuple>().is_err());
    }

    #[test]
    fn entity_parses_type_and_id() {
        let entity: Entity = "document:42".parse().unwrap();
        assert_eq!(entity, Entity::new("document", "42"));
        assert_eq!(entity.to_string(), "document:42");

        assert!("document".parse::<Entity>().is_err());
        assert!(":42".parse::<Entity>().is_err());
    }

    #[test]
    fn subject_parses_optional_relation() {
        let plain: Subject = "user:1".parse().unwrap();
        assert_eq!(plain.relation, "");

        let userset: Subject = "organization:acme#member".parse().unwrap();
        assert_eq!(userset.subject_type, "organization");
        assert_eq!(userset.id, "acme");
        assert_eq!(userset.relation, "member");
        assert_eq!(userset.to_string(), "organization:acme#member");
    }

    #[test]
    fn subject_without_relation_omits_field() {
        let json = serde_json::to_value(Subject::new("user", "1")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "user", "id": "1"}));
    }

    #[test]
    fn tuple_filter_skips_unset_parts() {
        let filter = TupleFilter::for_entity(EntityFilter::new("document").with_ids(vec!["1".into()]));
        let json = serde_json::to_value(filter).unwrap();

        assert_eq!(json, serde_json::json!({"entity": {"type": "document", "ids": ["1"]}}));
    }
}
