//! Derives `$name: Type` declarations from runtime variable values.
//!
//! Variable keys may carry a modifier suffix:
//!
//! | key                  | declaration                  |
//! |----------------------|------------------------------|
//! | `name`               | inferred from the value      |
//! | `name!`              | inferred from the value      |
//! | `name!CustomType`    | `$name: CustomType!`         |
//! | `name![ExplicitType]`| `$name: [ExplicitType]!`     |
//!
//! Inference maps strings to `String!`, booleans to `Boolean!`, integral
//! numbers to `Int!`, other numbers to `Float!` and arrays to
//! `[Element!]!` (typed from the first element). A string or number whose
//! variable is named `id` or ends in `Id`/`ID` is declared `ID!` instead.

use crate::Variables;
use crate::VariableDeclaration;
use indexmap::IndexSet;
use serde_json::Value;

/// A variable key split into its name and modifier suffix.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableSpec {
    explicit_type: Option<String>,
    forced_non_null: bool,
    name: String,
}
impl VariableSpec {
    /// The declaration for this variable given its runtime value, or `None`
    /// when no type can be inferred from the value.
    pub fn declaration(&self, value: Option<&Value>) -> Option<VariableDeclaration> {
        let type_annotation = match &self.explicit_type {
            Some(explicit_type) => format!("{explicit_type}!"),
            None => infer_type(&self.name, value)?,
        };
        Some(VariableDeclaration::new(self.name.as_str(), type_annotation))
    }

    pub fn explicit_type(&self) -> Option<&str> {
        self.explicit_type.as_deref()
    }

    pub fn forced_non_null(&self) -> bool {
        self.forced_non_null
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn parse(key: &str) -> Self {
        match key.split_once('!') {
            None => Self {
                explicit_type: None,
                forced_non_null: false,
                name: key.to_string(),
            },
            Some((name, "")) => Self {
                explicit_type: None,
                forced_non_null: true,
                name: name.to_string(),
            },
            Some((name, explicit_type)) => Self {
                explicit_type: Some(explicit_type.to_string()),
                forced_non_null: true,
                name: name.to_string(),
            },
        }
    }
}

/// Build the declaration list for an autodeclared signature.
///
/// Declarations follow the key order of `variables`. Names in `referenced`
/// that have no value are declared only when the name alone implies `ID!`.
/// Each name is declared once.
pub fn infer_declarations<S: AsRef<str>>(
    referenced: &[S],
    variables: &Variables,
) -> Vec<VariableDeclaration> {
    let mut seen = IndexSet::new();
    let mut declarations = vec![];

    for (key, value) in variables {
        let spec = VariableSpec::parse(key);
        if !seen.insert(spec.name.to_string()) {
            continue;
        }
        match spec.declaration(Some(value)) {
            Some(declaration) => declarations.push(declaration),
            None => log::warn!(
                "Unable to infer a GraphQL type for variable `${}` from value \
                `{value}`; it will not be declared.",
                spec.name,
            ),
        }
    }

    for name in referenced {
        let name = name.as_ref();
        if !seen.insert(name.to_string()) {
            continue;
        }
        if implies_id(name) {
            declarations.push(VariableDeclaration::new(name, "ID!"));
        } else {
            log::warn!(
                "Variable `${name}` is referenced but has no value to infer a \
                type from; it will not be declared."
            );
        }
    }

    declarations
}

/// Returns `variables` with every key reduced to its bare name, which is what
/// gets sent to the server. The first value wins if two keys share a name.
pub fn strip_modifiers(variables: &Variables) -> Variables {
    let mut stripped = Variables::new();
    for (key, value) in variables {
        let spec = VariableSpec::parse(key);
        if !stripped.contains_key(spec.name()) {
            stripped.insert(spec.name, value.clone());
        }
    }
    stripped
}

fn implies_id(name: &str) -> bool {
    name == "id" || name.ends_with("Id") || name.ends_with("ID")
}

fn infer_scalar(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("Boolean"),
        Value::Number(num) if num.is_i64() || num.is_u64() => Some("Int"),
        Value::Number(num) => match num.as_f64() {
            Some(float) if float.fract() == 0.0 => Some("Int"),
            _ => Some("Float"),
        },
        Value::String(_) => Some("String"),
        _ => None,
    }
}

fn infer_type(name: &str, value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Array(items)) => {
            let element = infer_scalar(items.first()?)?;
            Some(format!("[{element}!]!"))
        },
        Some(Value::String(_) | Value::Number(_)) if implies_id(name) => Some("ID!".to_string()),
        Some(value) => infer_scalar(value).map(|scalar| format!("{scalar}!")),
        None if implies_id(name) => Some("ID!".to_string()),
        None => None,
    }
}
