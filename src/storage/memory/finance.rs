use async_trait::async_trait;

use crate::{
    errors::AppError,
    storage::{
        memory::{InMemoryStore, Tables},
        models::{Cents, DateRange, Income, IncomeInput, RecurringInput, RecurringMovement},
        traits::FinanceStore,
    },
};

impl Tables {
    fn check_income_refs(&self, input: &IncomeInput) -> Result<(), AppError> {
        if let Some(client_id) = input.client_id {
            if !self.clients.contains_key(&client_id) {
                return Err(AppError::BadRequest("Client does not exist".to_string()));
            }
        }
        if let Some(contract_id) = input.contract_id {
            if !self.contracts.contains_key(&contract_id) {
                return Err(AppError::BadRequest("Contract does not exist".to_string()));
            }
        }
        Ok(())
    }
}

fn recurring_from(id: i64, input: &RecurringInput) -> RecurringMovement {
    RecurringMovement {
        id,
        kind: input.kind,
        concept: input.concept.clone(),
        amount_cents: input.amount_cents,
        frequency: input.frequency,
        next_date: input.next_date,
        active: input.active,
    }
}

#[async_trait]
impl FinanceStore for InMemoryStore {
    async fn list_incomes(&self, range: &DateRange) -> Result<Vec<Income>, AppError> {
        let mut incomes: Vec<Income> = self
            .read()
            .incomes
            .values()
            .filter(|i| range.contains(i.date))
            .cloned()
            .collect();
        incomes.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(incomes)
    }

    async fn get_income(&self, id: i64) -> Result<Option<Income>, AppError> {
        Ok(self.read().incomes.get(&id).cloned())
    }

    async fn create_income(&self, input: &IncomeInput) -> Result<Income, AppError> {
        let mut tables = self.write();
        tables.check_income_refs(input)?;
        let income = Income {
            id: tables.next_id(),
            client_id: input.client_id,
            contract_id: input.contract_id,
            concept: input.concept.clone(),
            total_cents: input.total_cents,
            date: input.date,
        };
        tables.incomes.insert(income.id, income.clone());
        Ok(income)
    }

    async fn update_income(
        &self,
        id: i64,
        input: &IncomeInput,
    ) -> Result<Option<Income>, AppError> {
        let mut tables = self.write();
        tables.check_income_refs(input)?;
        let Some(income) = tables.incomes.get_mut(&id) else {
            return Ok(None);
        };
        income.client_id = input.client_id;
        income.contract_id = input.contract_id;
        income.concept = input.concept.clone();
        income.total_cents = input.total_cents;
        income.date = input.date;
        Ok(Some(income.clone()))
    }

    async fn delete_income(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write().incomes.remove(&id).is_some())
    }

    async fn incomes_total(&self, range: &DateRange) -> Result<Cents, AppError> {
        Ok(self
            .read()
            .incomes
            .values()
            .filter(|i| range.contains(i.date))
            .map(|i| i.total_cents)
            .sum())
    }

    async fn list_recurring(&self) -> Result<Vec<RecurringMovement>, AppError> {
        let mut movements: Vec<RecurringMovement> =
            self.read().recurring.values().cloned().collect();
        movements.sort_by(|a, b| a.next_date.cmp(&b.next_date).then(a.id.cmp(&b.id)));
        Ok(movements)
    }

    async fn get_recurring(&self, id: i64) -> Result<Option<RecurringMovement>, AppError> {
        Ok(self.read().recurring.get(&id).cloned())
    }

    async fn create_recurring(
        &self,
        input: &RecurringInput,
    ) -> Result<RecurringMovement, AppError> {
        let mut tables = self.write();
        let movement = recurring_from(tables.next_id(), input);
        tables.recurring.insert(movement.id, movement.clone());
        Ok(movement)
    }

    async fn update_recurring(
        &self,
        id: i64,
        input: &RecurringInput,
    ) -> Result<Option<RecurringMovement>, AppError> {
        let mut tables = self.write();
        if !tables.recurring.contains_key(&id) {
            return Ok(None);
        }
        let movement = recurring_from(id, input);
        tables.recurring.insert(id, movement.clone());
        Ok(Some(movement))
    }

    async fn delete_recurring(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write().recurring.remove(&id).is_some())
    }
}
