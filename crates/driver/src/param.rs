//! Typed query parameters parsed from `type:value` configuration strings.

/// Bind type selected by the tag in front of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Let the driver coerce the literal to whatever the server expects.
    Object,
    /// Bind strictly as a character string.
    String,
    /// Bind as a national character string.
    NString,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Object => write!(f, "object"),
            ParamType::String => write!(f, "string"),
            ParamType::NString => write!(f, "nstring"),
        }
    }
}

impl std::str::FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "object" => Ok(ParamType::Object),
            "string" => Ok(ParamType::String),
            "nstring" => Ok(ParamType::NString),
            _ => Err(format!("Unknown parameter type: {s}")),
        }
    }
}

/// A parameter value ready to be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Object(String),
    Str(String),
    NStr(String),
}

impl ParamValue {
    /// Parse a configuration value such as `string:hello` or `42`.
    ///
    /// The value is split on the first `:`. A recognized tag (`object`,
    /// `string`, `nstring`, case-insensitive) selects the bind type. Without a
    /// colon the whole text is an [`ParamValue::Object`] literal. An
    /// unrecognized tag still consumes the prefix: the value falls back to
    /// `Object` of the text after the colon, and the rejected tag is returned
    /// so the caller can warn about it.
    pub fn parse(raw: &str) -> (ParamValue, Option<String>) {
        let Some((tag, value)) = raw.split_once(':') else {
            return (ParamValue::Object(raw.to_string()), None);
        };

        match tag.parse::<ParamType>() {
            Ok(param_type) => (ParamValue::new(param_type, value), None),
            Err(_) => (ParamValue::Object(value.to_string()), Some(tag.to_string())),
        }
    }

    pub fn new(param_type: ParamType, value: impl Into<String>) -> Self {
        let value = value.into();
        match param_type {
            ParamType::Object => ParamValue::Object(value),
            ParamType::String => ParamValue::Str(value),
            ParamType::NString => ParamValue::NStr(value),
        }
    }

    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Object(_) => ParamType::Object,
            ParamValue::Str(_) => ParamType::String,
            ParamValue::NStr(_) => ParamType::NString,
        }
    }

    /// The literal text, whatever the bind type.
    pub fn as_str(&self) -> &str {
        match self {
            ParamValue::Object(v) | ParamValue::Str(v) | ParamValue::NStr(v) => v,
        }
    }
}

/// A parameter bound to a 1-based placeholder position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub index: usize,
    pub value: ParamValue,
}
