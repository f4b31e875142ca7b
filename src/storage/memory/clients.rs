use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    errors::AppError,
    storage::{
        memory::{InMemoryStore, Tables},
        models::{
            Cents, ChecklistTemplate, Client, ClientInput, ClientQuery, Contract, ContractInput,
            ContractQuery,
        },
        traits::{ClientStore, ContractStore},
    },
};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Tables {
    fn income_references_contract(&self, contract_id: i64) -> bool {
        self.incomes
            .values()
            .any(|i| i.contract_id == Some(contract_id))
    }
}

#[async_trait]
impl ClientStore for InMemoryStore {
    async fn list_clients(&self, query: &ClientQuery) -> Result<Vec<Client>, AppError> {
        let tables = self.read();
        let mut clients: Vec<Client> = tables
            .clients
            .values()
            .filter(|c| query.active.is_none_or(|a| c.active == a))
            .filter(|c| {
                query
                    .search
                    .as_deref()
                    .is_none_or(|s| contains_ci(&c.name, s) || contains_ci(&c.phone, s))
            })
            .cloned()
            .collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(clients)
    }

    async fn get_client(&self, id: i64) -> Result<Option<Client>, AppError> {
        Ok(self.read().clients.get(&id).cloned())
    }

    async fn create_client(&self, input: &ClientInput) -> Result<Client, AppError> {
        let mut tables = self.write();
        let client = Client {
            id: tables.next_id(),
            name: input.name.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            active: input.active,
            registered_at: OffsetDateTime::now_utc(),
        };
        tables.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn update_client(
        &self,
        id: i64,
        input: &ClientInput,
    ) -> Result<Option<Client>, AppError> {
        let mut tables = self.write();
        let Some(client) = tables.clients.get_mut(&id) else {
            return Ok(None);
        };
        client.name = input.name.clone();
        client.phone = input.phone.clone();
        client.email = input.email.clone();
        client.address = input.address.clone();
        client.active = input.active;
        Ok(Some(client.clone()))
    }

    async fn delete_client(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write();
        if !tables.clients.contains_key(&id) {
            return Ok(false);
        }
        let contracts: Vec<i64> = tables
            .contracts
            .values()
            .filter(|c| c.client_id == id)
            .map(|c| c.id)
            .collect();
        let referenced = tables.incomes.values().any(|i| i.client_id == Some(id))
            || contracts
                .iter()
                .any(|c| tables.income_references_contract(*c));
        if referenced {
            return Err(AppError::Conflict(
                "Client is referenced by incomes".to_string(),
            ));
        }
        for contract in contracts {
            tables.remove_contract(contract);
        }
        let visits: Vec<i64> = tables
            .maintenances
            .values()
            .filter(|m| m.client_id == id)
            .map(|m| m.id)
            .collect();
        for visit in visits {
            tables.remove_maintenance(visit);
        }
        tables.clients.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ContractStore for InMemoryStore {
    async fn list_contracts(&self, query: &ContractQuery) -> Result<Vec<Contract>, AppError> {
        let tables = self.read();
        let contracts = tables
            .contracts
            .values()
            .filter(|c| query.kind.is_none_or(|k| c.kind == k))
            .filter(|c| query.active.is_none_or(|a| c.active == a))
            .filter(|c| query.client_id.is_none_or(|id| c.client_id == id))
            .filter(|c| {
                query.search.as_deref().is_none_or(|s| {
                    tables
                        .clients
                        .get(&c.client_id)
                        .is_some_and(|client| contains_ci(&client.name, s))
                })
            })
            .cloned()
            .collect();
        Ok(contracts)
    }

    async fn get_contract(&self, id: i64) -> Result<Option<Contract>, AppError> {
        Ok(self.read().contracts.get(&id).cloned())
    }

    async fn create_contract(&self, input: &ContractInput) -> Result<Contract, AppError> {
        let mut tables = self.write();
        if !tables.clients.contains_key(&input.client_id) {
            return Err(AppError::BadRequest("Client does not exist".to_string()));
        }
        let contract = Contract {
            id: tables.next_id(),
            client_id: input.client_id,
            kind: input.kind,
            monthly_price_cents: input.monthly_price_cents,
            start_date: input.start_date,
            active: input.active,
        };
        tables.contracts.insert(contract.id, contract.clone());
        Ok(contract)
    }

    async fn update_contract(
        &self,
        id: i64,
        input: &ContractInput,
    ) -> Result<Option<Contract>, AppError> {
        let mut tables = self.write();
        if !tables.clients.contains_key(&input.client_id) {
            return Err(AppError::BadRequest("Client does not exist".to_string()));
        }
        let Some(contract) = tables.contracts.get_mut(&id) else {
            return Ok(None);
        };
        contract.client_id = input.client_id;
        contract.kind = input.kind;
        contract.monthly_price_cents = input.monthly_price_cents;
        contract.start_date = input.start_date;
        contract.active = input.active;
        Ok(Some(contract.clone()))
    }

    async fn delete_contract(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write();
        if tables.income_references_contract(id) {
            return Err(AppError::Conflict(
                "Contract is referenced by incomes".to_string(),
            ));
        }
        Ok(tables.remove_contract(id))
    }

    async fn active_monthly_total(&self) -> Result<Cents, AppError> {
        Ok(self
            .read()
            .contracts
            .values()
            .filter(|c| c.active)
            .map(Contract::monthly_income)
            .sum())
    }

    async fn list_templates(&self, contract_id: i64) -> Result<Vec<ChecklistTemplate>, AppError> {
        Ok(self
            .read()
            .templates
            .values()
            .filter(|t| t.contract_id == contract_id)
            .cloned()
            .collect())
    }

    async fn add_template(
        &self,
        contract_id: i64,
        description: &str,
    ) -> Result<ChecklistTemplate, AppError> {
        let mut tables = self.write();
        if !tables.contracts.contains_key(&contract_id) {
            return Err(AppError::NotFound("Contract not found".to_string()));
        }
        let template = ChecklistTemplate {
            id: tables.next_id(),
            contract_id,
            description: description.to_string(),
        };
        tables.templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn delete_template(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write().templates.remove(&id).is_some())
    }
}
