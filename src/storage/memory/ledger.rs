use async_trait::async_trait;
use time::Date;

use crate::{
    errors::AppError,
    storage::{
        memory::InMemoryStore,
        models::{Cents, DateRange, Expense, ExpenseQuery, SupplyUsage, line_total},
        traits::LedgerStore,
    },
};

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn record_usage(
        &self,
        maintenance_id: i64,
        supply_id: i64,
        quantity: i64,
        date: Date,
    ) -> Result<SupplyUsage, AppError> {
        let mut tables = self.write();
        if !tables.maintenances.contains_key(&maintenance_id) {
            return Err(AppError::NotFound("Maintenance not found".to_string()));
        }
        let supply = tables
            .supplies
            .get(&supply_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Supply not found".to_string()))?;
        if supply.stock < quantity {
            return Err(AppError::Conflict(format!(
                "Insufficient stock for {}",
                supply.name
            )));
        }

        let total_cents = line_total(quantity, supply.price_cents)?;
        let expense = Expense {
            id: tables.next_id(),
            maintenance_id,
            supply_id,
            quantity,
            unit_cost_cents: supply.price_cents,
            total_cents,
            date,
        };
        let usage = SupplyUsage {
            id: tables.next_id(),
            maintenance_id,
            supply_id,
            quantity,
            expense_id: expense.id,
        };
        if let Some(stored) = tables.supplies.get_mut(&supply_id) {
            stored.stock -= quantity;
        }
        tables.expenses.insert(expense.id, expense);
        tables.usages.insert(usage.id, usage.clone());
        Ok(usage)
    }

    async fn update_usage(&self, id: i64, quantity: i64) -> Result<SupplyUsage, AppError> {
        let mut tables = self.write();
        let usage = tables
            .usages
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Usage not found".to_string()))?;
        let delta = quantity - usage.quantity;
        let total_cents = match tables.expenses.get(&usage.expense_id) {
            Some(expense) => Some(line_total(quantity, expense.unit_cost_cents)?),
            None => None,
        };
        let supply = tables
            .supplies
            .get_mut(&usage.supply_id)
            .ok_or_else(|| AppError::NotFound("Supply not found".to_string()))?;
        if delta > 0 && supply.stock < delta {
            return Err(AppError::Conflict(format!(
                "Insufficient stock for {}",
                supply.name
            )));
        }
        supply.stock -= delta;

        if let (Some(expense), Some(total_cents)) =
            (tables.expenses.get_mut(&usage.expense_id), total_cents)
        {
            expense.quantity = quantity;
            expense.total_cents = total_cents;
        }
        let updated = SupplyUsage { quantity, ..usage };
        tables.usages.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_usage(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write();
        let Some(usage) = tables.usages.remove(&id) else {
            return Ok(false);
        };
        tables.restore_stock(&usage);
        tables.expenses.remove(&usage.expense_id);
        Ok(true)
    }

    async fn get_usage(&self, id: i64) -> Result<Option<SupplyUsage>, AppError> {
        Ok(self.read().usages.get(&id).cloned())
    }

    async fn usages_for(&self, maintenance_id: i64) -> Result<Vec<SupplyUsage>, AppError> {
        Ok(self
            .read()
            .usages
            .values()
            .filter(|u| u.maintenance_id == maintenance_id)
            .cloned()
            .collect())
    }

    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>, AppError> {
        let mut expenses: Vec<Expense> = self
            .read()
            .expenses
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(expenses)
    }

    async fn get_expense(&self, id: i64) -> Result<Option<Expense>, AppError> {
        Ok(self.read().expenses.get(&id).cloned())
    }

    async fn delete_expense(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write();
        let Some(expense) = tables.expenses.remove(&id) else {
            return Ok(false);
        };
        let usage = tables
            .usages
            .values()
            .find(|u| u.expense_id == expense.id)
            .cloned();
        match usage {
            Some(usage) => {
                tables.restore_stock(&usage);
                tables.usages.remove(&usage.id);
            }
            None => {
                if let Some(supply) = tables.supplies.get_mut(&expense.supply_id) {
                    supply.stock = supply.stock.saturating_add(expense.quantity);
                }
            }
        }
        Ok(true)
    }

    async fn expenses_total(&self, range: &DateRange) -> Result<Cents, AppError> {
        Ok(self
            .read()
            .expenses
            .values()
            .filter(|e| range.contains(e.date))
            .fold(0, |total: Cents, e| total.saturating_add(e.total_cents)))
    }
}
