//! GraphQL document construction.

use burndown_core::config::QueryConfig;
use burndown_core::{BudgetError, BudgetResult};

/// Build the GraphQL document selecting the budget (`a`) and the error
/// timeseries (`b`) for the configured account.
pub fn build_query(config: &QueryConfig) -> BudgetResult<String> {
    let rate = config.target_success_rate;
    if !(0.0..=1.0).contains(&rate) {
        return Err(BudgetError::InvalidInput(format!(
            "target success rate {rate} is outside [0, 1]"
        )));
    }
    let event_type = nrql_fragment("event_type", &config.event_type)?;
    let window = nrql_fragment("window", &config.window)?;

    let budget_nrql =
        format!("SELECT (1 - {rate}) * count(*) AS 'a' FROM {event_type} SINCE {window}");
    let errors_nrql = format!(
        "SELECT count(*) AS 'b' FROM {event_type} WHERE error IS true TIMESERIES SINCE {window}"
    );

    Ok(format!(
        "{{ actor {{ account(id: {account}) {{ \
         a: nrql(query: \"{budget_nrql}\") {{ results }} \
         b: nrql(query: \"{errors_nrql}\") {{ results }} \
         }} }} }}",
        account = config.account_id,
    ))
}

/// JSON request body for the GraphQL endpoint.
pub fn request_body(config: &QueryConfig) -> BudgetResult<Vec<u8>> {
    let query = build_query(config)?;
    serde_json::to_vec(&serde_json::json!({ "query": query }))
        .map_err(|e| BudgetError::Query(format!("encode request: {e}")))
}

/// Values are spliced into a quoted string, so quotes and escapes are
/// refused outright.
fn nrql_fragment<'a>(field: &str, value: &'a str) -> BudgetResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BudgetError::InvalidInput(format!("{field} is empty")));
    }
    if value.contains(['"', '\\', '{', '}']) {
        return Err(BudgetError::InvalidInput(format!(
            "{field} contains reserved characters: {value}"
        )));
    }
    Ok(value)
}
