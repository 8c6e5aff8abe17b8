use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    catalog::Workshop,
    config::CertificatePolicy,
    error::{Error, Result},
    ledger::{Registration, RegistrationStatus},
    utils::local_now,
};

/// Whether a registration is active under the given policy.
pub fn registration_counts(registration: &Registration, policy: CertificatePolicy) -> bool {
    match registration.status {
        RegistrationStatus::Approved => true,
        RegistrationStatus::Pending => !policy.require_approval,
        RegistrationStatus::Rejected => false,
    }
}

/// A workshop without quizzes never unlocks a certificate. Otherwise the
/// learner needs an active registration and every quiz module passed.
pub fn is_eligible(
    workshop: &Workshop,
    registration: Option<&Registration>,
    completed: &BTreeSet<u32>,
    policy: CertificatePolicy,
) -> bool {
    let required = workshop.quiz_modules();
    if required.is_empty() {
        return false;
    }
    let Some(registration) = registration else {
        return false;
    };
    registration.workshop_id == workshop.id
        && registration_counts(registration, policy)
        && required.is_subset(completed)
}

/// (passed quiz modules, quiz modules) for progress display
pub fn progress(workshop: &Workshop, completed: &BTreeSet<u32>) -> (usize, usize) {
    let required = workshop.quiz_modules();
    (required.intersection(completed).count(), required.len())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub learner: String,
    pub workshop_id: String,
    pub workshop_title: String,
    pub modules: Vec<u32>,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
}

pub fn issue(
    workshop: &Workshop,
    registration: Option<&Registration>,
    completed: &BTreeSet<u32>,
    policy: CertificatePolicy,
) -> Result<Certificate> {
    match registration {
        Some(registration) if is_eligible(workshop, Some(registration), completed, policy) => {
            Ok(Certificate {
                learner: registration.learner.clone(),
                workshop_id: workshop.id.clone(),
                workshop_title: workshop.title.clone(),
                modules: workshop.quiz_modules().into_iter().collect(),
                issued_at: local_now(),
            })
        }
        _ => Err(Error::NotEligible(workshop.id.clone())),
    }
}
