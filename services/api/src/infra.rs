use caseflow::matching::{
    AssignmentNotifier, Case, ClaimType, CourtSystem, CoverageEntry, Lawyer, LawyerId,
    NotificationError, PerformanceRecord,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stands in for the e-mail/chat adapters until one is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingNotifier;

impl AssignmentNotifier for LoggingNotifier {
    fn notify_assigned(&self, case: &Case, lawyer: &Lawyer) -> Result<(), NotificationError> {
        info!(
            case_id = %case.id,
            lawyer_id = %lawyer.id,
            lawyer = %lawyer.name,
            claim_type = case.claim_type.label(),
            "assignment notification queued"
        );
        Ok(())
    }
}

struct Seed<'a> {
    id: &'a str,
    name: &'a str,
    province: &'a str,
    cities: &'a [&'a str],
    court_system: Option<CourtSystem>,
    specializations: &'a [ClaimType],
    certifications: &'a [&'a str],
    load: (u32, u32),
    history: (u32, u32, u32),
    success_rate: f64,
    avg_response_hours: f64,
    years: u32,
    available: bool,
}

impl Seed<'_> {
    fn into_lawyer(self) -> Lawyer {
        Lawyer {
            id: LawyerId(self.id.to_string()),
            name: self.name.to_string(),
            coverage: vec![CoverageEntry {
                province: self.province.to_string(),
                cities: self.cities.iter().map(|city| city.to_string()).collect(),
                court_system: self.court_system,
            }],
            specializations: self.specializations.iter().copied().collect(),
            certifications: self
                .certifications
                .iter()
                .map(|cert| cert.to_string())
                .collect::<BTreeSet<_>>(),
            active_cases: self.load.0,
            max_capacity: self.load.1,
            performance: PerformanceRecord {
                assigned: self.history.0,
                accepted: self.history.1,
                rejected: self.history.2,
                success_rate: self.success_rate,
                avg_response_hours: self.avg_response_hours,
                last_rejection_at: None,
            },
            available: self.available,
            leave: None,
            office_hours: None,
            years_of_experience: self.years,
        }
    }
}

/// Directory loaded into the in-memory store at startup.
pub(crate) fn seed_directory() -> Vec<Lawyer> {
    [
        Seed {
            id: "lw-ana",
            name: "Ana Pereyra",
            province: "Buenos Aires",
            cities: &["La Plata", "CABA", "Quilmes"],
            court_system: Some(CourtSystem::National),
            specializations: &[ClaimType::WrongfulDismissal, ClaimType::UnpaidWages],
            certifications: &["mediacion"],
            load: (3, 12),
            history: (40, 36, 4),
            success_rate: 82.0,
            avg_response_hours: 5.0,
            years: 11,
            available: true,
        },
        Seed {
            id: "lw-bruno",
            name: "Bruno Sosa",
            province: "Buenos Aires",
            cities: &["Mar del Plata", "Bahía Blanca"],
            court_system: None,
            specializations: &[ClaimType::UnpaidWages, ClaimType::UnregisteredEmployment],
            certifications: &[],
            load: (5, 10),
            history: (25, 20, 3),
            success_rate: 70.0,
            avg_response_hours: 10.0,
            years: 6,
            available: true,
        },
        Seed {
            id: "lw-carla",
            name: "Carla Méndez",
            province: "Córdoba",
            cities: &["Córdoba", "Río Cuarto"],
            court_system: Some(CourtSystem::Provincial),
            specializations: &[ClaimType::WorkplaceAccident, ClaimType::Harassment],
            certifications: &["art"],
            load: (2, 8),
            history: (30, 27, 2),
            success_rate: 88.0,
            avg_response_hours: 4.0,
            years: 9,
            available: true,
        },
        Seed {
            id: "lw-diego",
            name: "Diego Ibarra",
            province: "Santa Fe",
            cities: &["Rosario"],
            court_system: None,
            specializations: &[ClaimType::Discrimination, ClaimType::Harassment],
            certifications: &[],
            load: (7, 8),
            history: (15, 9, 4),
            success_rate: 55.0,
            avg_response_hours: 20.0,
            years: 3,
            available: true,
        },
        Seed {
            id: "lw-elena",
            name: "Elena Ruiz",
            province: "Buenos Aires",
            cities: &["La Plata"],
            court_system: None,
            specializations: &[ClaimType::WrongfulDismissal],
            certifications: &[],
            load: (1, 10),
            history: (18, 17, 1),
            success_rate: 90.0,
            avg_response_hours: 2.0,
            years: 10,
            available: false,
        },
    ]
    .into_iter()
    .map(Seed::into_lawyer)
    .collect()
}

pub(crate) fn parse_claim_type(raw: &str) -> Result<ClaimType, String> {
    let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| format!("unknown claim type '{raw}'"))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 ({err})"))
}
