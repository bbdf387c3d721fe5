//! Market-calendar administration: the schedule and holiday tables that the
//! resolver consumes. All writes require the admin role; reads are public.

use crate::{error::EngineError, ExecutionEngine};
use chrono::NaiveDate;
use core_types::{HolidaySession, Identity, MarketHolidayEntry, MarketScheduleEntry};
use tracing::info;

fn require_admin(caller: &Identity) -> Result<(), EngineError> {
    if caller.role.is_admin() {
        Ok(())
    } else {
        Err(EngineError::AdminRequired)
    }
}

impl ExecutionEngine {
    /// Fetches the weekly schedule, weekday ascending.
    pub async fn get_schedule(&self) -> Result<Vec<MarketScheduleEntry>, EngineError> {
        Ok(self.repo().get_schedule().await?)
    }

    /// Upserts the given schedule rows in one transaction and returns the
    /// full schedule as it now stands. Upsert semantics keyed on weekday
    /// keep the table at no more than 7 rows.
    pub async fn update_schedule(
        &self,
        caller: &Identity,
        rows: Vec<MarketScheduleEntry>,
    ) -> Result<Vec<MarketScheduleEntry>, EngineError> {
        require_admin(caller)?;
        for row in &rows {
            if !(0..=6).contains(&row.weekday) {
                return Err(EngineError::InvalidWeekday(row.weekday));
            }
        }
        let mut tx = self.repo().begin().await?;
        for row in &rows {
            self.repo().upsert_schedule_entry(&mut tx, row).await?;
        }
        tx.commit().await.map_err(database::DbError::from)?;
        info!(rows = rows.len(), "market schedule updated");
        self.get_schedule().await
    }

    /// Fetches all holiday overrides, date ascending.
    pub async fn get_holidays(&self) -> Result<Vec<MarketHolidayEntry>, EngineError> {
        Ok(self.repo().get_holidays().await?)
    }

    /// Upserts a holiday override keyed on its date. The session type must
    /// be one of the recognized values; `early_close` is accepted and
    /// stored even though the gate does not yet enforce it.
    pub async fn add_holiday(
        &self,
        caller: &Identity,
        entry: MarketHolidayEntry,
    ) -> Result<MarketHolidayEntry, EngineError> {
        require_admin(caller)?;
        entry
            .session_type
            .parse::<HolidaySession>()
            .map_err(|_| EngineError::InvalidSessionType(entry.session_type.clone()))?;
        let saved = self.repo().upsert_holiday(&entry).await?;
        info!(date = %saved.holiday_date, session = %saved.session_type, "holiday added");
        Ok(saved)
    }

    /// Removes one holiday override; fails if none exists for the date.
    pub async fn delete_holiday(
        &self,
        caller: &Identity,
        date: NaiveDate,
    ) -> Result<(), EngineError> {
        require_admin(caller)?;
        let removed = self.repo().delete_holiday(date).await?;
        if removed == 0 {
            return Err(EngineError::HolidayNotFound(date));
        }
        info!(%date, "holiday deleted");
        Ok(())
    }

    /// Clears the holiday table; returns how many rows were removed.
    pub async fn delete_all_holidays(&self, caller: &Identity) -> Result<u64, EngineError> {
        require_admin(caller)?;
        let removed = self.repo().delete_all_holidays().await?;
        info!(removed, "all holidays deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Role;
    use uuid::Uuid;

    #[test]
    fn admin_gate_branches_on_role() {
        let admin = Identity {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let user = Identity {
            user_id: Uuid::new_v4(),
            role: Role::User,
        };
        assert!(require_admin(&admin).is_ok());
        assert!(matches!(
            require_admin(&user),
            Err(EngineError::AdminRequired)
        ));
    }
}
