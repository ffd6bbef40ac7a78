use crate::aliases::AccountAliasTable;
use crate::error::{KpiError, Result};
use crate::formula::{parse_expression, BindingContext, Expr, Function};
use crate::schema::FinancialSnapshot;
use regex::Regex;
use std::sync::OnceLock;

/// `<identifier>[t<signed offset>]`, e.g. `ifrs_full_Revenue[t-1]` or `Assets[t]`.
const TIME_TOKEN_PATTERN: &str = r"([A-Za-z0-9_]+)\[t([+-]?\d*)\]";

fn time_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIME_TOKEN_PATTERN).expect("time token pattern is a valid regex"))
}

/// A formula whose account references have been replaced by internal names,
/// together with the value bound to each of those names.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundFormula {
    /// Rewritten formula text.
    pub expression: String,
    /// `expression` already parsed, ready for [`Expr::evaluate`].
    pub expr: Expr,
    pub context: BindingContext,
}

/// Internal variable name for a time-shifted reference. The sign is spelled out
/// so the name never contains an operator character.
pub fn time_variable_name(identifier: &str, offset: i32) -> String {
    format!("{}_t{}", identifier, offset).replace('-', "_minus_")
}

/// Resolves every account referenced by `formula` for `fiscal_year` and rewrites
/// the formula so it only contains names the evaluator grammar accepts.
///
/// Time-shifted tokens are bound first; any remaining bare identifier is a
/// current-year reference. The first account that cannot be resolved fails the
/// whole formula with [`KpiError::MissingAccount`].
pub fn bind(
    formula: &str,
    fiscal_year: i32,
    snapshot: &FinancialSnapshot,
    aliases: &AccountAliasTable,
) -> Result<BoundFormula> {
    let mut context = BindingContext::new();
    let mut expression = String::with_capacity(formula.len());
    let mut last_end = 0;

    for caps in time_token_regex().captures_iter(formula) {
        let Some(token) = caps.get(0) else { continue };
        let identifier = caps.get(1).map_or("", |m| m.as_str());
        let offset = parse_offset(caps.get(2).map_or("", |m| m.as_str()), token.start())?;

        let name = time_variable_name(identifier, offset);
        if !context.contains(&name) {
            let target_year = fiscal_year.checked_add(offset).ok_or_else(|| KpiError::Syntax {
                position: token.start(),
                details: format!("year offset {} is out of range", offset),
            })?;
            let value = resolve_account(snapshot, aliases, identifier, target_year)?;
            context.insert(name.clone(), value);
        }

        expression.push_str(&formula[last_end..token.start()]);
        expression.push_str(&name);
        last_end = token.end();
    }
    expression.push_str(&formula[last_end..]);

    let expr = parse_expression(&expression)?;
    for name in expr.variables() {
        if context.contains(name) || name.eq_ignore_ascii_case(Function::ABS_NAME) {
            continue;
        }
        let value = resolve_account(snapshot, aliases, name, fiscal_year)?;
        context.insert(name, value);
    }

    Ok(BoundFormula {
        expression,
        expr,
        context,
    })
}

fn parse_offset(raw: &str, position: usize) -> Result<i32> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i32>().map_err(|_| KpiError::Syntax {
        position,
        details: format!("invalid year offset 't{}'", raw),
    })
}

fn resolve_account(
    snapshot: &FinancialSnapshot,
    aliases: &AccountAliasTable,
    identifier: &str,
    year: i32,
) -> Result<i64> {
    snapshot
        .year(year)
        .and_then(|financials| aliases.resolve(financials, identifier))
        .ok_or_else(|| KpiError::MissingAccount {
            identifier: identifier.to_string(),
            year,
        })
}
