use async_trait::async_trait;

use crate::{
    errors::AppError,
    storage::{
        memory::InMemoryStore,
        models::{Supply, SupplyInput},
        traits::SupplyStore,
    },
};

#[async_trait]
impl SupplyStore for InMemoryStore {
    async fn list_supplies(&self, low_stock_only: bool) -> Result<Vec<Supply>, AppError> {
        let mut supplies: Vec<Supply> = self
            .read()
            .supplies
            .values()
            .filter(|s| !low_stock_only || s.low_stock())
            .cloned()
            .collect();
        supplies.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(supplies)
    }

    async fn get_supply(&self, id: i64) -> Result<Option<Supply>, AppError> {
        Ok(self.read().supplies.get(&id).cloned())
    }

    async fn create_supply(&self, input: &SupplyInput) -> Result<Supply, AppError> {
        let mut tables = self.write();
        let supply = Supply {
            id: tables.next_id(),
            name: input.name.clone(),
            stock: input.stock,
            min_stock: input.min_stock,
            price_cents: input.price_cents,
        };
        tables.supplies.insert(supply.id, supply.clone());
        Ok(supply)
    }

    async fn update_supply(
        &self,
        id: i64,
        input: &SupplyInput,
    ) -> Result<Option<Supply>, AppError> {
        let mut tables = self.write();
        let Some(supply) = tables.supplies.get_mut(&id) else {
            return Ok(None);
        };
        supply.name = input.name.clone();
        supply.stock = input.stock;
        supply.min_stock = input.min_stock;
        supply.price_cents = input.price_cents;
        Ok(Some(supply.clone()))
    }

    async fn delete_supply(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write();
        if tables.expenses.values().any(|e| e.supply_id == id)
            || tables.usages.values().any(|u| u.supply_id == id)
        {
            return Err(AppError::Conflict(
                "Supply is referenced by expenses".to_string(),
            ));
        }
        Ok(tables.supplies.remove(&id).is_some())
    }
}
