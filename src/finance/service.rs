use serde::Serialize;
use time::Date;

use crate::{
    AppState,
    errors::AppError,
    finance::recurring::{month_bounds, project},
    storage::models::{
        Cents, DateRange, Income, IncomeInput, MAX_CENTS, RecurringInput, RecurringMovement,
    },
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub from: Date,
    pub to: Date,
    pub incomes_cents: Cents,
    pub expenses_cents: Cents,
    pub recurring_income_cents: Cents,
    pub recurring_expense_cents: Cents,
    pub balance_cents: Cents,
}

pub struct FinanceService;

fn validate_income(input: &IncomeInput) -> Result<(), AppError> {
    if input.concept.trim().is_empty() {
        return Err(AppError::BadRequest("Concept is required".to_string()));
    }
    if input.total_cents < 0 {
        return Err(AppError::BadRequest("Total cannot be negative".to_string()));
    }
    if input.total_cents > MAX_CENTS {
        return Err(AppError::BadRequest("Total is out of range".to_string()));
    }
    Ok(())
}

fn validate_recurring(input: &RecurringInput) -> Result<(), AppError> {
    if input.concept.trim().is_empty() {
        return Err(AppError::BadRequest("Concept is required".to_string()));
    }
    if input.amount_cents < 0 {
        return Err(AppError::BadRequest("Amount cannot be negative".to_string()));
    }
    if input.amount_cents > MAX_CENTS {
        return Err(AppError::BadRequest("Amount is out of range".to_string()));
    }
    Ok(())
}

impl FinanceService {
    pub async fn list_incomes(
        state: &AppState,
        range: &DateRange,
    ) -> Result<Vec<Income>, AppError> {
        state.storage.finance.list_incomes(range).await
    }

    pub async fn get_income(state: &AppState, id: i64) -> Result<Income, AppError> {
        state
            .storage
            .finance
            .get_income(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Income not found".to_string()))
    }

    pub async fn create_income(state: &AppState, input: &IncomeInput) -> Result<Income, AppError> {
        validate_income(input)?;
        state.storage.finance.create_income(input).await
    }

    pub async fn update_income(
        state: &AppState,
        id: i64,
        input: &IncomeInput,
    ) -> Result<Income, AppError> {
        validate_income(input)?;
        state
            .storage
            .finance
            .update_income(id, input)
            .await?
            .ok_or_else(|| AppError::NotFound("Income not found".to_string()))
    }

    pub async fn delete_income(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.finance.delete_income(id).await? {
            return Err(AppError::NotFound("Income not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_recurring(state: &AppState) -> Result<Vec<RecurringMovement>, AppError> {
        state.storage.finance.list_recurring().await
    }

    pub async fn get_recurring(state: &AppState, id: i64) -> Result<RecurringMovement, AppError> {
        state
            .storage
            .finance
            .get_recurring(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recurring movement not found".to_string()))
    }

    pub async fn create_recurring(
        state: &AppState,
        input: &RecurringInput,
    ) -> Result<RecurringMovement, AppError> {
        validate_recurring(input)?;
        state.storage.finance.create_recurring(input).await
    }

    pub async fn update_recurring(
        state: &AppState,
        id: i64,
        input: &RecurringInput,
    ) -> Result<RecurringMovement, AppError> {
        validate_recurring(input)?;
        state
            .storage
            .finance
            .update_recurring(id, input)
            .await?
            .ok_or_else(|| AppError::NotFound("Recurring movement not found".to_string()))
    }

    pub async fn delete_recurring(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.finance.delete_recurring(id).await? {
            return Err(AppError::NotFound(
                "Recurring movement not found".to_string(),
            ));
        }
        Ok(())
    }

    /// Cash flow over `[from, to]`; a missing bound falls back to the current month.
    pub async fn summary(
        state: &AppState,
        from: Option<Date>,
        to: Option<Date>,
    ) -> Result<FinanceSummary, AppError> {
        let (month_start, month_end) = month_bounds(state.settings.today());
        let from = from.unwrap_or(month_start);
        let to = to.unwrap_or(month_end);
        if from > to {
            return Err(AppError::BadRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }

        let range = DateRange {
            from: Some(from),
            to: Some(to),
        };
        let incomes_cents = state.storage.finance.incomes_total(&range).await?;
        let expenses_cents = state.storage.ledger.expenses_total(&range).await?;
        let movements = state.storage.finance.list_recurring().await?;
        let out_of_range =
            || AppError::BadRequest("Summary totals are out of range".to_string());
        let (recurring_income_cents, recurring_expense_cents) =
            project(&movements, from, to).ok_or_else(out_of_range)?;
        let balance_cents = incomes_cents
            .checked_add(recurring_income_cents)
            .and_then(|c| c.checked_sub(expenses_cents))
            .and_then(|c| c.checked_sub(recurring_expense_cents))
            .ok_or_else(out_of_range)?;

        Ok(FinanceSummary {
            from,
            to,
            incomes_cents,
            expenses_cents,
            recurring_income_cents,
            recurring_expense_cents,
            balance_cents,
        })
    }
}
