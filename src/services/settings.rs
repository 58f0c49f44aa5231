//! Admin settings service

use crate::{
    error::{AppError, AppResult},
    models::{
        settings::{SeatMap, SettingsView, UpdateSettings},
        AdminSettings,
    },
    repository::{buses::BusesRepository, settings::SettingsRepository, Repository},
};

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
}

impl SettingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Settings snapshot for one booking request.
    ///
    /// Falls back to [`AdminSettings::closed`] when the row cannot be read.
    pub async fn snapshot(&self) -> AdminSettings {
        match self.repository.settings.get().await {
            Ok(settings) => settings,
            Err(err) => {
                tracing::error!(error = %err, "failed to read admin settings, booking treated as disabled");
                AdminSettings::closed()
            }
        }
    }

    pub async fn get(&self) -> AppResult<SettingsView> {
        let settings = self.repository.settings.get().await?;
        let bus_availability = self.seat_map().await?;
        Ok(SettingsView {
            booking_enabled: settings.booking_enabled,
            go_date: settings.go_date,
            return_date: settings.return_date,
            bus_availability,
        })
    }

    async fn seat_map(&self) -> AppResult<SeatMap> {
        Ok(self
            .repository
            .buses
            .availability()
            .await?
            .into_iter()
            .map(|bus| (bus.route_code, bus.available_seats))
            .collect())
    }

    /// Update the gate, travel dates and optional seat overrides atomically
    pub async fn update(&self, request: UpdateSettings) -> AppResult<SettingsView> {
        if let (Some(go), Some(back)) = (request.go_date, request.return_date) {
            if back < go {
                return Err(AppError::Validation(
                    "Return date cannot be before go date".to_string(),
                ));
            }
        }

        let mut tx = self.repository.pool.begin().await?;
        SettingsRepository::lock_on(&mut *tx).await?;

        let settings = SettingsRepository::upsert_on(
            &mut *tx,
            &AdminSettings {
                booking_enabled: request.booking_enabled,
                go_date: request.go_date,
                return_date: request.return_date,
            },
        )
        .await?;

        if let Some(ref overrides) = request.bus_availability {
            for (route, seats) in overrides {
                if BusesRepository::set_available_on(&mut *tx, route, *seats)
                    .await?
                    .is_none()
                {
                    // Dropping the transaction rolls back everything above
                    return Err(AppError::Validation(format!("Unknown route code: {}", route)));
                }
            }
        }
        tx.commit().await?;

        tracing::info!(
            booking_enabled = settings.booking_enabled,
            go_date = ?settings.go_date,
            return_date = ?settings.return_date,
            overrides = request.bus_availability.as_ref().map_or(0, |m| m.len()),
            "admin settings updated"
        );

        Ok(SettingsView {
            booking_enabled: settings.booking_enabled,
            go_date: settings.go_date,
            return_date: settings.return_date,
            bus_availability: self.seat_map().await?,
        })
    }
}
