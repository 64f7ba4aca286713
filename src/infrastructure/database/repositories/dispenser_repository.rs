//! SeaORM implementation of DispenserRepository

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::{
    Dispenser, DispenserRepository, DispenserStatus, DomainError, DomainResult, FlowVolume,
    UsageSession,
};
use crate::infrastructure::database::entities::{dispenser, dispenser_usage};

pub struct SeaOrmDispenserRepository {
    db: DatabaseConnection,
}

impl SeaOrmDispenserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn corrupt(what: &str, value: &str) -> DomainError {
    DomainError::Storage(format!("corrupt {} in database: {:?}", what, value))
}

fn parse_flow_volume(raw: &str) -> DomainResult<FlowVolume> {
    FlowVolume::from_str(raw).map_err(|_| corrupt("flow_volume", raw))
}

fn usage_to_domain(u: dispenser_usage::Model, dispenser_id: Uuid) -> DomainResult<UsageSession> {
    Ok(UsageSession {
        id: Some(u.id),
        dispenser_id,
        opened_at: u.opened_at,
        closed_at: u.closed_at,
        flow_volume: parse_flow_volume(&u.flow_volume)?,
    })
}

fn model_to_domain(
    d: dispenser::Model,
    usages: Vec<dispenser_usage::Model>,
) -> DomainResult<Dispenser> {
    let id = Uuid::parse_str(&d.id).map_err(|_| corrupt("dispenser id", &d.id))?;
    let status = DispenserStatus::parse(&d.status).ok_or_else(|| corrupt("status", &d.status))?;
    let usages = usages
        .into_iter()
        .map(|u| usage_to_domain(u, id))
        .collect::<DomainResult<Vec<_>>>()?;

    let dispenser = Dispenser::restore(
        id,
        parse_flow_volume(&d.flow_volume)?,
        status,
        usages,
        d.created_at,
    );
    dispenser.check_invariants()?;
    Ok(dispenser)
}

fn new_usage_model(usage: &UsageSession) -> dispenser_usage::ActiveModel {
    dispenser_usage::ActiveModel {
        id: NotSet,
        dispenser_id: Set(usage.dispenser_id.to_string()),
        opened_at: Set(usage.opened_at),
        closed_at: Set(usage.closed_at),
        flow_volume: Set(usage.flow_volume.to_string()),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

// ── DispenserRepository impl ────────────────────────────────────

#[async_trait]
impl DispenserRepository for SeaOrmDispenserRepository {
    async fn create(&self, flow_volume: FlowVolume) -> DomainResult<Dispenser> {
        let d = Dispenser::new(flow_volume, Utc::now());
        debug!("Creating dispenser: {} (flow_volume={})", d.id, d.flow_volume);

        let model = dispenser::ActiveModel {
            id: Set(d.id.to_string()),
            flow_volume: Set(d.flow_volume.to_string()),
            status: Set(d.status().as_str().to_string()),
            created_at: Set(d.created_at),
        };
        model.insert(&self.db).await.map_err(db_err)?;
        Ok(d)
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Dispenser>> {
        let Some(model) = dispenser::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let usages = dispenser_usage::Entity::find()
            .filter(dispenser_usage::Column::DispenserId.eq(model.id.clone()))
            .order_by_asc(dispenser_usage::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        model_to_domain(model, usages).map(Some)
    }

    async fn save(&self, d: &mut Dispenser) -> DomainResult<()> {
        debug!("Saving dispenser: {} (status={})", d.id, d.status());

        // Dropping the transaction without commit rolls it back.
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = dispenser::Entity::find_by_id(d.id.to_string())
            .one(&txn)
            .await
            .map_err(db_err)?;
        let Some(existing) = existing else {
            return Err(DomainError::dispenser_not_found(d.id));
        };

        let mut active: dispenser::ActiveModel = existing.into();
        active.status = Set(d.status().as_str().to_string());
        active.update(&txn).await.map_err(db_err)?;

        // A close only ever touches the newest session, and only when no
        // session was appended after it.
        if let Some(last) = d.last_usage() {
            if let Some(usage_id) = last.id {
                let update = dispenser_usage::ActiveModel {
                    id: Set(usage_id),
                    dispenser_id: NotSet,
                    opened_at: NotSet,
                    closed_at: Set(last.closed_at),
                    flow_volume: NotSet,
                };
                update.update(&txn).await.map_err(db_err)?;
            }
        }

        let mut assigned = Vec::new();
        for (index, usage) in d.usages().iter().enumerate() {
            if usage.is_persisted() {
                continue;
            }
            let inserted = new_usage_model(usage).insert(&txn).await.map_err(db_err)?;
            debug!("Inserted usage {} for dispenser {}", inserted.id, d.id);
            assigned.push((index, inserted.id));
        }

        txn.commit().await.map_err(db_err)?;

        for (index, usage_id) in assigned {
            d.record_usage_id(index, usage_id);
        }
        Ok(())
    }
}
