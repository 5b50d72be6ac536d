use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::status::{Badge, BadgeTone};
use crate::utils::decimal::option_decimal_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Draft,
    Scheduled,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn badge(self) -> Badge {
        match self {
            JobStatus::Draft => Badge::new("Draft", BadgeTone::Neutral),
            JobStatus::Scheduled => Badge::new("Scheduled", BadgeTone::Info),
            JobStatus::InProgress => Badge::new("In Progress", BadgeTone::Info),
            JobStatus::OnHold => Badge::new("On Hold", BadgeTone::Warning),
            JobStatus::Completed => Badge::new("Completed", BadgeTone::Success),
            JobStatus::Cancelled => Badge::new("Cancelled", BadgeTone::Danger),
            JobStatus::Unknown => Badge::new("Unknown", BadgeTone::Neutral),
        }
    }

    pub fn is_open(self) -> bool {
        !matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub client: i64,
    pub title: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "option_decimal_string")]
    pub budget: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Job {
    /// Open and past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.map(|d| d < today).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    InProgress,
    Blocked,
    Done,
    #[serde(other)]
    Unknown,
}

impl MilestoneStatus {
    pub fn badge(self) -> Badge {
        match self {
            MilestoneStatus::Pending => Badge::new("Pending", BadgeTone::Neutral),
            MilestoneStatus::InProgress => Badge::new("In Progress", BadgeTone::Info),
            MilestoneStatus::Blocked => Badge::new("Blocked", BadgeTone::Danger),
            MilestoneStatus::Done => Badge::new("Done", BadgeTone::Success),
            MilestoneStatus::Unknown => Badge::new("Unknown", BadgeTone::Neutral),
        }
    }
}

/// A tracking milestone on a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub job: i64,
    pub title: String,
    #[serde(default)]
    pub status: MilestoneStatus,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Missing values sort after present ones.
fn cmp_present_first<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Display order: explicit `sort_order`, then due date, then id.
pub fn sort_milestones(milestones: &mut [Milestone]) {
    milestones.sort_by(|a, b| {
        cmp_present_first(&a.sort_order, &b.sort_order)
            .then_with(|| cmp_present_first(&a.due_date, &b.due_date))
            .then_with(|| cmp_present_first(&a.id, &b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone(id: i64, sort_order: Option<i32>, due: Option<&str>) -> Milestone {
        Milestone {
            id: Some(id),
            job: 1,
            title: format!("m{}", id),
            sort_order,
            due_date: due.map(|d| d.parse().unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_sort_milestones() {
        let mut list = vec![
            milestone(1, None, None),
            milestone(2, None, Some("2024-03-01")),
            milestone(3, Some(2), None),
            milestone(4, Some(1), Some("2024-05-01")),
            milestone(5, Some(1), Some("2024-04-01")),
            milestone(6, None, Some("2024-02-01")),
        ];
        sort_milestones(&mut list);
        let ids: Vec<i64> = list.iter().filter_map(|m| m.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 6, 2, 1]);
    }

    #[test]
    fn test_parse_job_with_unknown_status() {
        let job: Job = serde_json::from_str(
            r#"{"id": 4, "client": 7, "title": "Roof repair", "status": "awaiting_parts", "due_date": "2024-06-30", "budget": 1500.5}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Unknown);
        assert_eq!(job.budget.as_deref(), Some("1500.50"));
        assert_eq!(job.due_date, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn test_job_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let mut job = Job {
            client: 7,
            title: "Roof repair".to_string(),
            status: JobStatus::InProgress,
            due_date: NaiveDate::from_ymd_opt(2024, 6, 30),
            ..Default::default()
        };
        assert!(job.is_overdue(today));

        job.status = JobStatus::Completed;
        assert!(!job.is_overdue(today));
    }

    #[test]
    fn test_status_badges() {
        let status: JobStatus = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(status.badge().to_string(), "[In Progress]");
        assert_eq!(JobStatus::Cancelled.badge().tone, BadgeTone::Danger);
        assert_eq!(MilestoneStatus::Done.badge().tone, BadgeTone::Success);
    }
}
