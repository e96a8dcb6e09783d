//! Trade Center Core - predicate builder and backend client for the marketplace
//!
//! This crate parses the composite constraint language used by the discount
//! and purchase-policy pages, builds typed leaf constraints, and submits the
//! resulting `predicate_builder` trees to the backend. Python bindings are
//! provided via PyO3.

use pyo3::prelude::*;

pub mod client;
pub mod config;
pub mod constraint;
pub mod error;
pub mod logging;
pub mod predicate;
pub mod realtime;

use crate::client::ApiClient;
use crate::error::TradeCenterError;
use crate::predicate::{Operand, PredicateNode, Scalar};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::types::{PyDict, PyList};
use std::sync::Arc;

// ============================================================================
// Cached Client
// ============================================================================

/// Global cached backend client
static CACHED_CLIENT: OnceCell<Arc<RwLock<ApiClient>>> = OnceCell::new();

// ============================================================================
// Helper Functions
// ============================================================================

fn cached_client() -> PyResult<ApiClient> {
    let client = CACHED_CLIENT.get().ok_or_else(|| {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(
            "Client not initialized. Call init_client() first.",
        )
    })?;
    Ok(client.read().clone())
}

fn scalar_to_py<'py>(py: Python<'py>, scalar: &Scalar) -> PyResult<Bound<'py, PyAny>> {
    let value = match scalar {
        Scalar::Integer(i) => (*i).into_pyobject(py)?.into_any(),
        Scalar::Float(f) => (*f).into_pyobject(py)?.into_any(),
        Scalar::String(s) => s.as_str().into_pyobject(py)?.into_any(),
    };
    Ok(value)
}

/// Convert a tree into nested Python lists, same shape as the JSON payload
fn node_to_py<'py>(py: Python<'py>, node: &PredicateNode) -> PyResult<Bound<'py, PyList>> {
    let list = PyList::empty(py);
    match node {
        PredicateNode::Composite { op, left, right } => {
            list.append(op.as_str())?;
            list.append(node_to_py(py, left)?)?;
            list.append(node_to_py(py, right)?)?;
        }
        PredicateNode::Leaf { tag, operands } => {
            list.append(tag.as_str())?;
            for operand in operands {
                match operand {
                    Operand::Scalar(scalar) => list.append(scalar_to_py(py, scalar)?)?,
                    Operand::Location(location) => {
                        let dict = PyDict::new(py);
                        dict.set_item("address", &location.address)?;
                        dict.set_item("city", &location.city)?;
                        dict.set_item("state", &location.state)?;
                        dict.set_item("country", &location.country)?;
                        dict.set_item("zip_code", &location.zip_code)?;
                        list.append(dict)?;
                    }
                }
            }
        }
    }
    Ok(list)
}

// ============================================================================
// Python Functions
// ============================================================================

/// Split an expression into tokens, discarding parentheses
#[pyfunction]
#[pyo3(name = "tokenize")]
fn py_tokenize(expression: &str) -> Vec<String> {
    predicate::tokenize(expression)
}

/// Classify a token as int, float or str
#[pyfunction]
#[pyo3(name = "map_scalar")]
fn py_map_scalar(py: Python<'_>, token: &str) -> PyResult<Py<PyAny>> {
    Ok(scalar_to_py(py, &predicate::map_scalar(token))?.unbind())
}

/// Parse a composite predicate string into nested lists
///
/// # Returns
/// `None` when the expression holds no tokens
///
/// # Raises
/// ValueError for expressions that cannot form a tree
#[pyfunction]
fn parse_predicate(py: Python<'_>, expression: &str) -> PyResult<Option<Py<PyAny>>> {
    match predicate::get_or_parse(expression)? {
        Some(node) => Ok(Some(node_to_py(py, &node)?.into_any().unbind())),
        None => Ok(None),
    }
}

/// Normalize an expression to its canonical parenthesized form
#[pyfunction]
fn render_predicate(expression: &str) -> PyResult<Option<String>> {
    Ok(predicate::get_or_parse(expression)?.map(|node| node.to_string()))
}

/// Initialize the backend client (call once at startup)
///
/// # Arguments
/// * `config` - {"api_url": str, "token": str | None, "log_level": str, "log_json": bool}
#[pyfunction]
fn init_client(config: &Bound<'_, PyDict>) -> PyResult<()> {
    let client_config = config::deserialize_client_config(config)?;
    logging::init(&client_config.log);

    let client = ApiClient::new(&client_config)?;

    // If already initialized, replace the client
    if let Some(existing) = CACHED_CLIENT.get() {
        *existing.write() = client;
    } else {
        let _ = CACHED_CLIENT.set(Arc::new(RwLock::new(client)));
    }

    Ok(())
}

/// Check if the client is initialized
#[pyfunction]
fn is_client_initialized() -> bool {
    CACHED_CLIENT.get().is_some()
}

/// Replace (or clear, with None) the bearer token used by later requests
#[pyfunction]
#[pyo3(signature = (token=None))]
fn set_token(token: Option<String>) -> PyResult<()> {
    let client = cached_client()?;
    match token {
        Some(token) => client.tokens().set(token),
        None => client.tokens().clear(),
    }
    Ok(())
}

/// Parse an expression and attach it to a discount
///
/// The expression is parsed before the request starts, so syntax errors are
/// raised immediately rather than from the awaitable.
///
/// # Returns
/// A Python awaitable resolving to the backend's JSON response text
///
/// # Example (Python)
/// ```python
/// body = await assign_predicate_async(3, 1, "(and (age 17) (season summer))")
/// ```
#[pyfunction]
fn assign_predicate_async<'py>(
    py: Python<'py>,
    discount_id: i64,
    store_id: i64,
    expression: &str,
) -> PyResult<Bound<'py, PyAny>> {
    let client = cached_client()?;
    let node = predicate::get_or_parse(expression)?.ok_or_else(|| {
        TradeCenterError::InvalidPredicate("Expression is empty".to_string())
    })?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let response = client
            .assign_predicate_to_discount(discount_id, store_id, &node)
            .await?;
        Ok::<String, PyErr>(response.to_string())
    })
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn trade_center_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_tokenize, m)?)?;
    m.add_function(wrap_pyfunction!(py_map_scalar, m)?)?;
    m.add_function(wrap_pyfunction!(parse_predicate, m)?)?;
    m.add_function(wrap_pyfunction!(render_predicate, m)?)?;
    m.add_function(wrap_pyfunction!(init_client, m)?)?;
    m.add_function(wrap_pyfunction!(is_client_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(set_token, m)?)?;
    m.add_function(wrap_pyfunction!(assign_predicate_async, m)?)?;
    Ok(())
}
