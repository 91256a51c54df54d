use crate::error::JsonLdSyntaxError;
use crate::MAX_NESTING_DEPTH;
use json_event_parser::JsonEvent;
use oxiri::Iri;
use std::collections::HashMap;
use std::slice;

/// A JSON value with the object keys kept in document order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum JsonNode {
    String(String),
    Number(String),
    Boolean(bool),
    Null,
    Array(Vec<JsonNode>),
    Object(Vec<(String, JsonNode)>),
}

impl JsonNode {
    /// The elements of an array, or the value itself for other values.
    pub fn as_items(&self) -> &[JsonNode] {
        if let Self::Array(items) = self {
            items
        } else {
            slice::from_ref(self)
        }
    }
}

pub fn object_get<'a>(entries: &'a [(String, JsonNode)], key: &str) -> Option<&'a JsonNode> {
    entries.iter().find_map(|(k, v)| (k == key).then_some(v))
}

enum BuildingNode {
    Object(Vec<(String, JsonNode)>),
    ObjectWithPendingKey(Vec<(String, JsonNode)>, String),
    Array(Vec<JsonNode>),
}

/// Builds a [`JsonNode`] from the JSON events of one value.
#[derive(Default)]
pub struct JsonNodeBuilder {
    stack: Vec<BuildingNode>,
}

impl JsonNodeBuilder {
    /// Adds an event, returns the value once it is complete.
    pub fn push(&mut self, event: JsonEvent<'_>) -> Result<Option<JsonNode>, JsonLdSyntaxError> {
        Ok(match event {
            JsonEvent::String(value) => self.after_value(JsonNode::String(value.into())),
            JsonEvent::Number(value) => self.after_value(JsonNode::Number(value.into())),
            JsonEvent::Boolean(value) => self.after_value(JsonNode::Boolean(value)),
            JsonEvent::Null => self.after_value(JsonNode::Null),
            JsonEvent::StartArray => {
                self.push_container(BuildingNode::Array(Vec::new()))?;
                None
            }
            JsonEvent::StartObject => {
                self.push_container(BuildingNode::Object(Vec::new()))?;
                None
            }
            JsonEvent::ObjectKey(key) => {
                if let Some(BuildingNode::Object(object)) = self.stack.pop() {
                    self.stack
                        .push(BuildingNode::ObjectWithPendingKey(object, key.into()));
                }
                None
            }
            JsonEvent::EndArray | JsonEvent::EndObject => match self.stack.pop() {
                Some(BuildingNode::Object(object)) => self.after_value(JsonNode::Object(object)),
                Some(BuildingNode::Array(array)) => self.after_value(JsonNode::Array(array)),
                Some(BuildingNode::ObjectWithPendingKey(..)) | None => {
                    return Err(JsonLdSyntaxError::msg("Unbalanced JSON value"));
                }
            },
            JsonEvent::Eof => {
                return Err(JsonLdSyntaxError::msg("Unexpected end of the JSON document"));
            }
        })
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn push_container(&mut self, node: BuildingNode) -> Result<(), JsonLdSyntaxError> {
        if self.stack.len() >= MAX_NESTING_DEPTH {
            return Err(JsonLdSyntaxError::msg(format!(
                "The maximal nesting depth of {MAX_NESTING_DEPTH} has been exceeded"
            )));
        }
        self.stack.push(node);
        Ok(())
    }

    fn after_value(&mut self, value: JsonNode) -> Option<JsonNode> {
        match self.stack.pop() {
            Some(BuildingNode::ObjectWithPendingKey(mut object, key)) => {
                object.push((key, value));
                self.stack.push(BuildingNode::Object(object));
                None
            }
            Some(BuildingNode::Array(mut array)) => {
                array.push(value);
                self.stack.push(BuildingNode::Array(array));
                None
            }
            Some(BuildingNode::Object(object)) => {
                // A value without key, the JSON parser never emits it
                self.stack.push(BuildingNode::Object(object));
                None
            }
            None => Some(value),
        }
    }
}

/// How the values of a term are grouped.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum JsonLdContainer {
    #[default]
    None,
    List,
    Set,
    Language,
    Index,
}

#[derive(Clone, PartialEq, Debug)]
pub struct JsonLdTermDefinition {
    /// `None` if the term is explicitly mapped to `null`
    pub iri_mapping: Option<String>,
    pub prefix_flag: bool,
    pub reverse_property: bool,
    pub container_mapping: JsonLdContainer,
    // None is unset, Some(None) is set to null
    pub language_mapping: Option<Option<String>>,
    pub type_mapping: Option<String>,
}

#[derive(Default, Clone, Debug)]
pub struct JsonLdContext {
    pub base_iri: Option<Iri<String>>,
    pub original_base_iri: Option<Iri<String>>,
    pub vocabulary_mapping: Option<String>,
    pub default_language: Option<String>,
    pub term_definitions: HashMap<String, JsonLdTermDefinition>,
}

impl JsonLdContext {
    pub fn new_empty(original_base_iri: Option<Iri<String>>) -> Self {
        Self {
            base_iri: original_base_iri.clone(),
            original_base_iri,
            vocabulary_mapping: None,
            default_language: None,
            term_definitions: HashMap::new(),
        }
    }

    /// [Context Processing Algorithm](https://www.w3.org/TR/json-ld-api/#algorithm) without remote contexts.
    pub fn process(&self, local_context: &JsonNode) -> Result<Self, JsonLdSyntaxError> {
        let mut result = self.clone();
        for context in local_context.as_items() {
            let context = match context {
                JsonNode::Null => {
                    result = Self::new_empty(self.original_base_iri.clone());
                    continue;
                }
                JsonNode::String(iri) => {
                    return Err(JsonLdSyntaxError::unsupported(format!(
                        "remote context {iri}"
                    )));
                }
                JsonNode::Object(context) => context,
                JsonNode::Array(_) | JsonNode::Number(_) | JsonNode::Boolean(_) => {
                    return Err(JsonLdSyntaxError::msg(
                        "@context value must be null, a string or an object",
                    ));
                }
            };
            let mut terms = Vec::new();
            for (key, value) in context {
                match key.as_str() {
                    "@version" => {
                        if *value != JsonNode::Number("1.1".into()) {
                            return Err(JsonLdSyntaxError::msg(
                                "The only supported @version value is 1.1",
                            ));
                        }
                    }
                    "@base" => match value {
                        JsonNode::Null => result.base_iri = None,
                        JsonNode::String(value) => {
                            result.base_iri = Some(
                                if let Some(base_iri) = &result.base_iri {
                                    base_iri.resolve(value)
                                } else {
                                    Iri::parse(value.clone())
                                }
                                .map_err(|e| JsonLdSyntaxError::invalid_iri(value.clone(), e))?,
                            )
                        }
                        _ => return Err(JsonLdSyntaxError::msg("@base value must be a string")),
                    },
                    "@vocab" => match value {
                        JsonNode::Null => result.vocabulary_mapping = None,
                        JsonNode::String(value) => {
                            let vocab = if value.starts_with("_:") {
                                value.clone()
                            } else {
                                result.expand_iri(value, true, true).ok_or_else(|| {
                                    JsonLdSyntaxError::msg(format!("Invalid @vocab '{value}'"))
                                })?
                            };
                            result.vocabulary_mapping = Some(vocab);
                        }
                        _ => {
                            return Err(JsonLdSyntaxError::msg("@vocab value must be a string"));
                        }
                    },
                    "@language" => match value {
                        JsonNode::Null => result.default_language = None,
                        JsonNode::String(value) => {
                            result.default_language = Some(value.to_ascii_lowercase())
                        }
                        _ => {
                            return Err(JsonLdSyntaxError::msg(
                                "@language value must be a string",
                            ));
                        }
                    },
                    // Term protection has no effect on the produced statements
                    "@protected" | "@propagate" => {
                        if !matches!(value, JsonNode::Boolean(_)) {
                            return Err(JsonLdSyntaxError::msg(format!(
                                "{key} value must be a boolean"
                            )));
                        }
                    }
                    "@import" | "@direction" => {
                        return Err(JsonLdSyntaxError::unsupported(format!(
                            "{key} in contexts"
                        )));
                    }
                    _ => terms.push(key.as_str()),
                }
            }
            let mut creator = TermDefinitionCreator {
                local_context: context,
                defined: HashMap::new(),
            };
            for term in terms {
                creator.create(&mut result, term)?;
            }
        }
        Ok(result)
    }

    /// [IRI Expansion](https://www.w3.org/TR/json-ld-api/#iri-expansion)
    ///
    /// Returns `None` if the value is mapped to `null` or is an unknown keyword.
    pub fn expand_iri(&self, value: &str, document_relative: bool, vocab: bool) -> Option<String> {
        if has_keyword_form(value) {
            return is_keyword(value).then(|| value.into());
        }
        if let Some(definition) = self.term_definitions.get(value) {
            let iri_mapping = definition.iri_mapping.as_ref()?;
            if vocab || is_keyword(iri_mapping) {
                return Some(iri_mapping.clone());
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.into());
            }
            if let Some(JsonLdTermDefinition {
                iri_mapping: Some(iri_mapping),
                prefix_flag: true,
                ..
            }) = self.term_definitions.get(prefix)
            {
                return Some(format!("{iri_mapping}{suffix}"));
            }
            if Iri::parse(value).is_ok() {
                return Some(value.into());
            }
        }
        if vocab {
            if let Some(vocabulary_mapping) = &self.vocabulary_mapping {
                return Some(format!("{vocabulary_mapping}{value}"));
            }
        }
        if document_relative {
            if let Some(base_iri) = &self.base_iri {
                if let Ok(iri) = base_iri.resolve(value) {
                    return Some(iri.into_inner());
                }
            }
        }
        Some(value.into())
    }
}

/// [Create Term Definition](https://www.w3.org/TR/json-ld-api/#create-term-definition) on one local context.
struct TermDefinitionCreator<'a> {
    local_context: &'a [(String, JsonNode)],
    // false while the definition is in progress
    defined: HashMap<&'a str, bool>,
}

impl<'a> TermDefinitionCreator<'a> {
    fn create(
        &mut self,
        active_context: &mut JsonLdContext,
        term: &'a str,
    ) -> Result<(), JsonLdSyntaxError> {
        match self.defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(JsonLdSyntaxError::msg(format!(
                    "Cyclic IRI mapping for term {term}"
                )));
            }
            None => (),
        }
        if term.is_empty() {
            return Err(JsonLdSyntaxError::msg(
                "@context terms must not be the empty strings",
            ));
        }
        if has_keyword_form(term) {
            if is_keyword(term) {
                return Err(JsonLdSyntaxError::msg(format!(
                    "{term} keyword can't be redefined in context"
                )));
            }
            // Keyword-like terms are ignored
            return Ok(());
        }
        self.defined.insert(term, false);
        active_context.term_definitions.remove(term);

        let Some(value) = object_get(self.local_context, term) else {
            return Ok(());
        };
        let id_only;
        let value: &[(String, JsonNode)] = match value {
            JsonNode::Null => {
                id_only = [("@id".to_owned(), JsonNode::Null)];
                &id_only
            }
            JsonNode::String(id) => {
                id_only = [("@id".to_owned(), JsonNode::String(id.clone()))];
                &id_only
            }
            JsonNode::Object(entries) => entries,
            _ => {
                return Err(JsonLdSyntaxError::msg(format!(
                    "The definition of {term} must be null, a string or an object"
                )));
            }
        };

        let mut definition = JsonLdTermDefinition {
            iri_mapping: None,
            prefix_flag: false,
            reverse_property: false,
            container_mapping: JsonLdContainer::None,
            language_mapping: None,
            type_mapping: None,
        };
        let mut has_iri_mapping = false;
        for (key, key_value) in value {
            match key.as_str() {
                "@id" => match key_value {
                    JsonNode::Null => has_iri_mapping = true,
                    JsonNode::String(id) => {
                        if id == term {
                            continue;
                        }
                        has_iri_mapping = true;
                        let expanded = self.expand_iri(active_context, id, false, true)?;
                        if expanded.as_deref() == Some("@context") {
                            return Err(JsonLdSyntaxError::msg(
                                "@context cannot be aliased with @id",
                            ));
                        }
                        definition.prefix_flag = !term.contains(':')
                            && !term.contains('/')
                            && expanded.as_ref().is_some_and(|iri| {
                                iri.ends_with([':', '/', '?', '#', '[', ']', '@'])
                                    || iri.starts_with("_:")
                            });
                        definition.iri_mapping = expanded;
                    }
                    _ => return Err(JsonLdSyntaxError::msg("@id value must be a string")),
                },
                "@reverse" => {
                    let JsonNode::String(id) = key_value else {
                        return Err(JsonLdSyntaxError::msg(
                            "@reverse value must be a string in a context",
                        ));
                    };
                    if object_get(value, "@id").is_some() {
                        return Err(JsonLdSyntaxError::msg(
                            "@reverse and @id cannot be used together in a context",
                        ));
                    }
                    has_iri_mapping = true;
                    definition.iri_mapping = self.expand_iri(active_context, id, false, true)?;
                    definition.reverse_property = true;
                }
                "@type" => {
                    let JsonNode::String(r#type) = key_value else {
                        return Err(JsonLdSyntaxError::msg(
                            "The value of @type in a context must be a string",
                        ));
                    };
                    let r#type = self
                        .expand_iri(active_context, r#type, false, true)?
                        .filter(|t| {
                            matches!(t.as_str(), "@id" | "@vocab" | "@json")
                                || !has_keyword_form(t) && Iri::parse(t.as_str()).is_ok()
                        })
                        .ok_or_else(|| {
                            JsonLdSyntaxError::msg(format!(
                                "Invalid @type value in the definition of {term}: {type}"
                            ))
                        })?;
                    definition.type_mapping = Some(r#type);
                }
                "@container" => {
                    let mut containers = key_value
                        .as_items()
                        .iter()
                        .map(|c| match c {
                            JsonNode::String(c) => Ok(c.as_str()),
                            _ => Err(JsonLdSyntaxError::msg(
                                "@container value must be a string or an array of strings",
                            )),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    containers.sort_unstable();
                    definition.container_mapping = match containers.as_slice() {
                        ["@list"] => JsonLdContainer::List,
                        ["@set"] => JsonLdContainer::Set,
                        ["@language"] | ["@language", "@set"] => JsonLdContainer::Language,
                        ["@index"] | ["@index", "@set"] => JsonLdContainer::Index,
                        _ => {
                            return Err(JsonLdSyntaxError::msg(format!(
                                "Unsupported @container value in the definition of {term}"
                            )));
                        }
                    };
                }
                "@language" => {
                    definition.language_mapping = Some(match key_value {
                        JsonNode::String(language) => Some(language.to_ascii_lowercase()),
                        JsonNode::Null => None,
                        _ => {
                            return Err(JsonLdSyntaxError::msg(
                                "@language value must be a string or null",
                            ));
                        }
                    })
                }
                "@protected" | "@index" => (),
                _ => {
                    return Err(JsonLdSyntaxError::msg(format!(
                        "Unsupported key in the definition of {term}: '{key}'"
                    )));
                }
            }
        }
        if definition.reverse_property
            && !matches!(
                definition.container_mapping,
                JsonLdContainer::None | JsonLdContainer::Set | JsonLdContainer::Index
            )
        {
            return Err(JsonLdSyntaxError::msg(
                "@reverse is only compatible with @index or @set containers",
            ));
        }

        if !has_iri_mapping {
            definition.iri_mapping = Some(
                if let Some((prefix, suffix)) = term.split_once(':').filter(|(p, _)| *p != "_") {
                    // Compact IRI used as a term
                    if object_get(self.local_context, prefix).is_some() {
                        self.create(active_context, local_key(self.local_context, prefix))?;
                    }
                    match active_context.term_definitions.get(prefix) {
                        Some(JsonLdTermDefinition {
                            iri_mapping: Some(iri_mapping),
                            ..
                        }) => format!("{iri_mapping}{suffix}"),
                        _ => term.into(),
                    }
                } else if let Some(vocabulary_mapping) = &active_context.vocabulary_mapping {
                    format!("{vocabulary_mapping}{term}")
                } else {
                    return Err(JsonLdSyntaxError::msg(format!(
                        "No @vocab key to build an IRI from the {term} term definition"
                    )));
                },
            );
        }

        active_context
            .term_definitions
            .insert(term.into(), definition);
        self.defined.insert(term, true);
        Ok(())
    }

    /// IRI expansion that first defines the terms of the local context it depends on.
    fn expand_iri(
        &mut self,
        active_context: &mut JsonLdContext,
        value: &str,
        document_relative: bool,
        vocab: bool,
    ) -> Result<Option<String>, JsonLdSyntaxError> {
        if !has_keyword_form(value) {
            if object_get(self.local_context, value).is_some()
                && self.defined.get(value) != Some(&true)
            {
                self.create(active_context, local_key(self.local_context, value))?;
            }
            if let Some((prefix, _)) = value.split_once(':') {
                if object_get(self.local_context, prefix).is_some()
                    && self.defined.get(prefix) != Some(&true)
                {
                    self.create(active_context, local_key(self.local_context, prefix))?;
                }
            }
        }
        Ok(active_context.expand_iri(value, document_relative, vocab))
    }
}

/// The key of the local context equal to `name`, borrowed from the context itself.
fn local_key<'a>(local_context: &'a [(String, JsonNode)], name: &str) -> &'a str {
    local_context
        .iter()
        .find_map(|(k, _)| (k == name).then_some(k.as_str()))
        .unwrap_or_default()
}

pub fn has_keyword_form(value: &str) -> bool {
    value
        .strip_prefix('@')
        .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_alphabetic()))
}

pub fn is_keyword(value: &str) -> bool {
    matches!(
        value,
        "@base"
            | "@container"
            | "@context"
            | "@direction"
            | "@graph"
            | "@id"
            | "@import"
            | "@included"
            | "@index"
            | "@json"
            | "@language"
            | "@list"
            | "@nest"
            | "@none"
            | "@prefix"
            | "@propagate"
            | "@protected"
            | "@reverse"
            | "@set"
            | "@type"
            | "@value"
            | "@version"
            | "@vocab"
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use json_event_parser::SliceJsonParser;

    fn parse_json(data: &str) -> Result<JsonNode, JsonLdSyntaxError> {
        let mut parser = SliceJsonParser::new(data.as_bytes());
        let mut builder = JsonNodeBuilder::default();
        loop {
            if let Some(node) = builder.push(parser.parse_next()?)? {
                return Ok(node);
            }
        }
    }

    fn context(data: &str) -> Result<JsonLdContext, JsonLdSyntaxError> {
        JsonLdContext::new_empty(None).process(&parse_json(data)?)
    }

    #[test]
    fn test_object_keys_keep_document_order() -> Result<(), JsonLdSyntaxError> {
        let JsonNode::Object(entries) = parse_json(r#"{"b": 1, "a": [true, null]}"#)? else {
            panic!("object expected")
        };
        assert_eq!(entries[0].0, "b");
        assert_eq!(
            entries[1].1,
            JsonNode::Array(vec![JsonNode::Boolean(true), JsonNode::Null])
        );
        Ok(())
    }

    #[test]
    fn test_prefixes_and_terms() -> Result<(), JsonLdSyntaxError> {
        let context = context(
            r#"{"name": "schema:name", "schema": "http://schema.org/", "knows": {"@id": "schema:knows", "@type": "@id"}}"#,
        )?;
        assert_eq!(
            context.expand_iri("name", false, true).as_deref(),
            Some("http://schema.org/name")
        );
        assert_eq!(
            context.expand_iri("schema:Person", false, true).as_deref(),
            Some("http://schema.org/Person")
        );
        assert!(context.term_definitions["schema"].prefix_flag);
        assert!(!context.term_definitions["name"].prefix_flag);
        assert_eq!(
            context.term_definitions["knows"].type_mapping.as_deref(),
            Some("@id")
        );
        Ok(())
    }

    #[test]
    fn test_vocab_and_base() -> Result<(), JsonLdSyntaxError> {
        let context = context(
            r#"{"@vocab": "http://example.com/vocab#", "@base": "http://example.com/doc/"}"#,
        )?;
        assert_eq!(
            context.expand_iri("label", false, true).as_deref(),
            Some("http://example.com/vocab#label")
        );
        assert_eq!(
            context.expand_iri("../other", true, false).as_deref(),
            Some("http://example.com/other")
        );
        Ok(())
    }

    #[test]
    fn test_null_resets_the_context() -> Result<(), JsonLdSyntaxError> {
        let context = context(r#"[{"ex": "http://example.com/"}, null]"#)?;
        assert!(context.term_definitions.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_contexts() {
        assert!(context(r#""http://example.com/context.jsonld""#).is_err());
        assert!(context(r#"{"a": "b:x", "b": "a:y"}"#).is_err());
        assert!(context(r#"{"@id": "http://example.com/"}"#).is_err());
        assert!(context(r#"{"term": 1}"#).is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let data = format!("{}{}", "[".repeat(1000), "]".repeat(1000));
        assert!(parse_json(&data).is_err());
    }
}
