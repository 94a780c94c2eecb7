use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{document} does not conform to its schema: {}", violations.join("; "))]
    Violations {
        document: &'static str,
        violations: Vec<String>,
    },
}

/// JSON value kinds a field may be constrained to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
}

impl ValueKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Number => value.is_number(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Object => value.is_object(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Object => "object",
        }
    }
}

/// Constraints for a single field of a configuration document.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: ValueKind,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<&'static str>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
}

impl FieldRule {
    pub const fn of(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            min_length: None,
            max_length: None,
            pattern: None,
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
        }
    }

    pub const fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub const fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub const fn pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub const fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    pub const fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    pub const fn exclusive_minimum(mut self, min: f64) -> Self {
        self.exclusive_minimum = Some(min);
        self
    }

    fn check(&self, value: &Value, violations: &mut Vec<String>) {
        if !self.kind.matches(value) {
            violations.push(format!("'{}' must be of type {}", self.name, self.kind.name()));
            return;
        }
        if let Some(s) = value.as_str() {
            if self.min_length.is_some_and(|min| s.chars().count() < min) {
                violations.push(format!(
                    "'{}' must contain at least {} characters",
                    self.name,
                    self.min_length.unwrap_or_default()
                ));
            }
            if self.max_length.is_some_and(|max| s.chars().count() > max) {
                violations.push(format!(
                    "'{}' must contain at most {} characters",
                    self.name,
                    self.max_length.unwrap_or_default()
                ));
            }
            if let Some(pattern) = self.pattern {
                // Patterns are static literals, a failed compilation is a programming error.
                let re = Regex::new(pattern).expect("static schema pattern must compile");
                if !re.is_match(s) {
                    violations.push(format!("'{}' must match pattern {}", self.name, pattern));
                }
            }
        }
        if let Some(n) = value.as_f64() {
            if self.minimum.is_some_and(|min| n < min) {
                violations.push(format!(
                    "'{}' must be greater than or equal to {}",
                    self.name,
                    self.minimum.unwrap_or_default()
                ));
            }
            if self.maximum.is_some_and(|max| n > max) {
                violations.push(format!(
                    "'{}' must be less than or equal to {}",
                    self.name,
                    self.maximum.unwrap_or_default()
                ));
            }
            if self.exclusive_minimum.is_some_and(|min| n <= min) {
                violations.push(format!(
                    "'{}' must be strictly greater than {}",
                    self.name,
                    self.exclusive_minimum.unwrap_or_default()
                ));
            }
        }
    }
}

/// A static, versioned schema for one of the two configuration documents.
///
/// Unknown keys are not an error: the deployment parameters object is
/// open-ended and forward compatible.
pub struct Schema {
    pub document: &'static str,
    pub required: &'static [&'static str],
    pub fields: &'static [FieldRule],
}

impl Schema {
    /// Checks `data` against the schema, reporting every violation before
    /// failing so operators see all problems in a single run.
    pub fn validate(&self, data: &Value) -> Result<(), SchemaError> {
        let mut violations = Vec::new();

        match data.as_object() {
            None => violations.push(format!("{} must be a JSON object", self.document)),
            Some(object) => {
                for required in self.required {
                    if !object.contains_key(*required) {
                        violations.push(format!("required field '{required}' is missing"));
                    }
                }
                for rule in self.fields {
                    if let Some(value) = object.get(rule.name) {
                        rule.check(value, &mut violations);
                    }
                }
            }
        }

        if violations.is_empty() {
            return Ok(());
        }
        for violation in &violations {
            error!("{}: {violation}", self.document);
        }
        Err(SchemaError::Violations {
            document: self.document,
            violations,
        })
    }
}
