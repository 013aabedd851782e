use crate::{Error, Result};
use std::{fmt, str::FromStr};

/// How type and field names turn into table and column names.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// `UserModel` stays `UserModel`.
    AsIs,
    /// `UserModel` becomes `user_model`.
    #[default]
    Underline,
    /// `UserModel` becomes `userModel`.
    CamelCase,
}

impl Strategy {
    /// Apply the strategy to an identifier.
    ///
    /// Every literal `ID` is first rewritten to `Id`, whatever the strategy, so
    /// `UserID` becomes `user_id` rather than `user_i_d`. Only ASCII upper case
    /// letters start a new word.
    pub fn resolve(self, name: &str) -> String {
        let name = name.strip_prefix("r#").unwrap_or(name).replace("ID", "Id");
        match self {
            Strategy::AsIs => name,
            Strategy::Underline => {
                let mut out = String::with_capacity(name.len() + 4);
                for (i, c) in name.chars().enumerate() {
                    if i == 0 {
                        out.extend(c.to_lowercase());
                    } else if c.is_ascii_uppercase() {
                        out.push('_');
                        out.push(c.to_ascii_lowercase());
                    } else {
                        out.push(c);
                    }
                }
                out
            }
            Strategy::CamelCase => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "as_is" | "asis" | "default" => Ok(Strategy::AsIs),
            "underline" | "snake_case" => Ok(Strategy::Underline),
            "camel_case" | "camelcase" => Ok(Strategy::CamelCase),
            _ => Err(Error::msg(format!("Unknown naming strategy `{}`", value))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::AsIs => "as_is",
            Strategy::Underline => "underline",
            Strategy::CamelCase => "camel_case",
        })
    }
}

/// Shorthand for [`Strategy::resolve`].
pub fn resolve(name: &str, strategy: Strategy) -> String {
    strategy.resolve(name)
}
