//! Semantic types
//!
//! A semantic type names what an artifact means rather than how it is
//! stored. Types may declare fields (`StatsTable[kind]`) and other types
//! register as variants of a field (`Pairwise` fills `StatsTable.kind`).

use crate::error::{Result, StatsError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A field of a semantic type, e.g. `StatsTable.kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRef {
    pub type_name: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticType {
    pub name: String,
    pub field_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_of: Option<FieldRef>,
}

impl SemanticType {
    pub fn new(name: &str, field_names: &[&str]) -> Self {
        SemanticType {
            name: name.to_string(),
            field_names: field_names.iter().map(|f| f.to_string()).collect(),
            variant_of: None,
        }
    }

    pub fn variant(name: &str, type_name: &str, field: &str) -> Self {
        SemanticType {
            name: name.to_string(),
            field_names: Vec::new(),
            variant_of: Some(FieldRef {
                type_name: type_name.to_string(),
                field: field.to_string(),
            }),
        }
    }
}

/// Parsed type expression. Each field holds a union of member names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub name: String,
    pub fields: Vec<Vec<String>>,
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.fields.is_empty() {
            let fields: Vec<String> = self.fields.iter().map(|u| u.join(" | ")).collect();
            write!(f, "[{}]", fields.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, SemanticType>,
}

impl TypeRegistry {
    /// Registry holding the types used by the pairwise actions.
    pub fn builtin() -> Self {
        let mut registry = TypeRegistry::default();
        for ty in [
            SemanticType::new("StatsTable", &["kind"]),
            SemanticType::variant("Pairwise", "StatsTable", "kind"),
            SemanticType::new("Dist1D", &["order", "dependence"]),
            SemanticType::variant("Ordered", "Dist1D", "order"),
            SemanticType::variant("Unordered", "Dist1D", "order"),
            SemanticType::variant("Independent", "Dist1D", "dependence"),
            SemanticType::variant("Matched", "Dist1D", "dependence"),
        ] {
            registry.register(ty);
        }
        registry
    }

    pub fn register(&mut self, ty: SemanticType) {
        self.types.insert(ty.name.clone(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&SemanticType> {
        self.types.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SemanticType> {
        self.types.values()
    }

    /// Parse and check an expression such as `Dist1D[Ordered | Unordered, Independent]`.
    pub fn parse(&self, expr: &str) -> Result<TypeExpr> {
        let parsed = parse_expr(expr)?;
        let invalid = |msg: String| StatsError::InvalidType(format!("{}: {}", expr.trim(), msg));

        let ty = self
            .get(&parsed.name)
            .ok_or_else(|| invalid(format!("unknown type '{}'", parsed.name)))?;

        if parsed.fields.is_empty() {
            return Ok(parsed);
        }
        if parsed.fields.len() != ty.field_names.len() {
            return Err(invalid(format!(
                "'{}' takes {} field(s), got {}",
                ty.name,
                ty.field_names.len(),
                parsed.fields.len()
            )));
        }

        for (field, members) in ty.field_names.iter().zip(&parsed.fields) {
            for member in members {
                let variant = self
                    .get(member)
                    .ok_or_else(|| invalid(format!("unknown type '{}'", member)))?;
                let fits = variant
                    .variant_of
                    .as_ref()
                    .is_some_and(|r| r.type_name == ty.name && &r.field == field);
                if !fits {
                    return Err(invalid(format!(
                        "'{}' is not a variant of {}.{}",
                        member, ty.name, field
                    )));
                }
            }
        }
        Ok(parsed)
    }
}

fn parse_expr(expr: &str) -> Result<TypeExpr> {
    let invalid = |msg: &str| StatsError::InvalidType(format!("{}: {}", expr.trim(), msg));
    let expr = expr.trim();

    let (name, rest) = match expr.find('[') {
        Some(open) => (&expr[..open], Some(&expr[open + 1..])),
        None => (expr, None),
    };
    let name = name.trim();
    if !is_identifier(name) {
        return Err(invalid("expected a type name"));
    }

    let fields = match rest {
        None => Vec::new(),
        Some(rest) => {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| invalid("missing closing ']'"))?;
            if inner.contains('[') || inner.contains(']') {
                return Err(invalid("nested fields are not supported"));
            }
            let mut fields = Vec::new();
            for field in inner.split(',') {
                let members: Vec<String> = field.split('|').map(|m| m.trim().to_string()).collect();
                if members.iter().any(|m| !is_identifier(m)) {
                    return Err(invalid("expected a type name in field"));
                }
                fields.push(members);
            }
            fields
        }
    };

    Ok(TypeExpr {
        name: name.to_string(),
        fields,
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
