//! Parameter binding from `p1`..`pN` configuration values.

use crate::driver::Statement;
use crate::error::DriverError;
use crate::param::{ParamValue, ParameterSpec};
use crate::sql::count_placeholders;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Resolve the parameters to bind for `query`.
///
/// Walks positions `1..=placeholders` and stops at the first position with no
/// configured value; later values are ignored even if present. Unknown type
/// tags are logged and bound as objects.
pub fn resolve_parameters(query: &str, values: &BTreeMap<usize, String>) -> Vec<ParameterSpec> {
    let placeholders = count_placeholders(query);
    let mut specs = Vec::with_capacity(placeholders);

    for index in 1..=placeholders {
        let Some(raw) = values.get(&index) else {
            break;
        };
        info!("p{} = {}", index, raw);

        let (value, rejected_tag) = ParamValue::parse(raw);
        if let Some(tag) = rejected_tag {
            warn!("Unknown type {} use object", tag);
        }
        specs.push(ParameterSpec { index, value });
    }

    specs
}

/// Bind the configured parameters onto a prepared statement.
///
/// Returns the number of positions bound.
pub fn bind_parameters(
    statement: &mut (dyn Statement + '_),
    query: &str,
    values: &BTreeMap<usize, String>,
) -> Result<usize, DriverError> {
    let specs = resolve_parameters(query, values);
    for spec in &specs {
        statement.bind(spec.index, &spec.value)?;
    }
    Ok(specs.len())
}
