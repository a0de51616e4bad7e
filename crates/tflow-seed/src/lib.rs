//! One-shot synthetic data seeding for a fresh TalentFlow store.

mod bank;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tflow_core::{
    new_id, slugify, AssessmentDocument, Candidate, CandidateStage, Job, JobStatus, Question,
    QuestionType, Section, ShowIf, ShowIfValue, TimelineEvent,
};
use tflow_storage::{Database, Store, StoreError, SEEDED_META_KEY};
use tracing::info;

use crate::bank::{ChoiceQuestion, MULTI_CHOICE, SINGLE_CHOICE};

pub const CRATE_NAME: &str = "tflow-seed";

pub const JOB_COUNT: usize = bank::JOB_TITLES.len();
pub const CANDIDATE_COUNT: usize = 1000;
pub const TIMELINE_CANDIDATES: usize = 200;
pub const SECTIONS_PER_ASSESSMENT: usize = bank::SECTION_TITLES.len();
pub const QUESTIONS_PER_SECTION: usize = 10;

/// Question-bank family a job title belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sde,
    Data,
    Design,
    Hr,
    Sales,
    General,
}

impl Role {
    const KEYWORDS: [(Role, &'static [&'static str]); 5] = [
        (Role::Sde, &["sde", "engineer", "developer"]),
        (Role::Data, &["data", "scientist", "analyst"]),
        (Role::Design, &["ui", "ux", "design"]),
        (Role::Hr, &["hr", "recruit"]),
        (Role::Sales, &["sales", "marketing", "growth"]),
    ];

    /// First role whose keywords appear in the title, case-insensitively.
    pub fn classify(title: &str) -> Role {
        let title = title.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| title.contains(w)))
            .map(|(role, _)| *role)
            .unwrap_or(Role::General)
    }

    fn prompts(self) -> &'static [&'static str] {
        match self {
            Role::Sde | Role::General => &bank::SDE_PROMPTS,
            Role::Data => &bank::DATA_PROMPTS,
            Role::Design => &bank::DESIGN_PROMPTS,
            Role::Hr => &bank::HR_PROMPTS,
            Role::Sales => &bank::SALES_PROMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub jobs: usize,
    pub assessments: usize,
    pub candidates: usize,
    pub timeline_events: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded(SeedSummary),
    AlreadySeeded,
}

/// Every record a first run writes.
#[derive(Debug, Clone)]
pub struct SeedDataset {
    pub jobs: Vec<Job>,
    pub assessments: Vec<AssessmentDocument>,
    pub candidates: Vec<Candidate>,
    pub timelines: Vec<TimelineEvent>,
}

impl SeedDataset {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Self {
        let jobs = generate_jobs(now);
        let assessments = jobs
            .iter()
            .map(|job| AssessmentDocument {
                job_id: job.id.clone(),
                sections: generate_sections(&job.id, &job.title),
                updated_at: now,
            })
            .collect();
        let candidates = generate_candidates(rng, &jobs, now);
        let timelines = candidates
            .iter()
            .take(TIMELINE_CANDIDATES)
            .map(|c| {
                TimelineEvent::stage_change(&c.id, c.stage, c.created_at + Duration::hours(1))
            })
            .collect();

        Self {
            jobs,
            assessments,
            candidates,
            timelines,
        }
    }

    pub fn summary(&self) -> SeedSummary {
        SeedSummary {
            jobs: self.jobs.len(),
            assessments: self.assessments.len(),
            candidates: self.candidates.len(),
            timeline_events: self.timelines.len(),
        }
    }

    fn write_into(self, db: &mut Database) -> Result<(), StoreError> {
        db.jobs.bulk_insert(self.jobs)?;
        for doc in self.assessments {
            db.assessments.put(doc);
        }
        db.candidates.bulk_insert(self.candidates)?;
        db.timelines.bulk_insert(self.timelines)?;
        db.set_meta(SEEDED_META_KEY, JsonValue::Bool(true));
        Ok(())
    }
}

/// Populate the store unless its seeding flag is already set.
pub async fn ensure_seeded<R: Rng + ?Sized>(
    store: &Store,
    rng: &mut R,
) -> Result<SeedOutcome, StoreError> {
    if store.read(Database::is_seeded).await {
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let dataset = SeedDataset::generate(rng, Utc::now());
    let summary = dataset.summary();
    let outcome = store
        .transaction(|db| {
            if db.is_seeded() {
                return Ok(SeedOutcome::AlreadySeeded);
            }
            dataset.write_into(db)?;
            Ok::<_, StoreError>(SeedOutcome::Seeded(summary))
        })
        .await?;

    if let SeedOutcome::Seeded(summary) = outcome {
        info!(
            jobs = summary.jobs,
            assessments = summary.assessments,
            candidates = summary.candidates,
            timeline_events = summary.timeline_events,
            "store seeded"
        );
    }
    Ok(outcome)
}

fn generate_jobs(now: DateTime<Utc>) -> Vec<Job> {
    bank::JOB_TITLES
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let days = i64::try_from(i).unwrap_or_default();
            Job {
                id: new_id(),
                title: title.to_string(),
                slug: format!("{}-{}", slugify(title), i + 1),
                status: JobStatus::ALL[i % JobStatus::ALL.len()],
                tags: vec![bank::TAGS[i % bank::TAGS.len()].to_string()],
                order: u32::try_from(i).unwrap_or(u32::MAX),
                description: format!(
                    "We are seeking a {title} to join our corporate team. \
                     Collaborate cross-functionally to deliver measurable impact."
                ),
                requirements: bank::REQUIREMENTS.iter().map(|r| r.to_string()).collect(),
                stipend: (i % 5 == 0).then(|| bank::STIPEND.to_string()),
                deadline: Some(now + Duration::days(days + 7)),
                scope: Some(bank::SCOPE.to_string()),
                created_at: now - Duration::days(days),
            }
        })
        .collect()
}

pub fn generate_sections(job_id: &str, job_title: &str) -> Vec<Section> {
    bank::SECTION_TITLES
        .iter()
        .enumerate()
        .map(|(section_index, title)| Section {
            id: format!("{job_id}-sec-{}", section_index + 1),
            title: title.to_string(),
            questions: generate_questions(job_id, section_index, job_title),
        })
        .collect()
}

/// Ten questions cycling role prompt, logical, single choice and multi choice by position.
pub fn generate_questions(job_id: &str, section_index: usize, job_title: &str) -> Vec<Question> {
    let role = Role::classify(job_title);
    let mut questions = (0..QUESTIONS_PER_SECTION)
        .map(|i| {
            let id = format!("{job_id}-q-{section_index}-{i}");
            let pick = i + section_index;
            match i % 4 {
                0 => {
                    let prompts = role.prompts();
                    text_question(
                        id,
                        QuestionType::LongText,
                        prompts[pick % prompts.len()],
                        true,
                        "coding",
                        1500,
                    )
                }
                1 => text_question(
                    id,
                    QuestionType::ShortText,
                    bank::LOGICAL_PROMPTS[pick % bank::LOGICAL_PROMPTS.len()],
                    false,
                    "logical",
                    500,
                ),
                2 => choice_question(
                    id,
                    QuestionType::SingleChoice,
                    &SINGLE_CHOICE[pick % SINGLE_CHOICE.len()],
                    true,
                    "gk",
                ),
                _ => choice_question(
                    id,
                    QuestionType::MultiChoice,
                    &MULTI_CHOICE[pick % MULTI_CHOICE.len()],
                    false,
                    "mcq",
                ),
            }
        })
        .collect::<Vec<_>>();

    if questions.len() > 2 {
        let first_id = questions[0].id.clone();
        if let Some(last) = questions.last_mut() {
            last.show_if = Some(ShowIf {
                question_id: first_id,
                equals: ShowIfValue::Text("A".to_string()),
            });
        }
    }
    questions
}

fn text_question(
    id: String,
    kind: QuestionType,
    label: &str,
    required: bool,
    topic: &str,
    max_length: u32,
) -> Question {
    Question {
        id,
        kind,
        label: label.to_string(),
        required: required.then_some(true),
        options: None,
        numeric_range: None,
        max_length: Some(max_length),
        show_if: None,
        topic: Some(topic.to_string()),
    }
}

fn choice_question(
    id: String,
    kind: QuestionType,
    choice: &ChoiceQuestion,
    required: bool,
    topic: &str,
) -> Question {
    Question {
        id,
        kind,
        label: choice.label.to_string(),
        required: required.then_some(true),
        options: Some(choice.options.iter().map(|o| o.to_string()).collect()),
        numeric_range: None,
        max_length: None,
        show_if: None,
        topic: Some(topic.to_string()),
    }
}

fn generate_candidates<R: Rng + ?Sized>(
    rng: &mut R,
    jobs: &[Job],
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    (0..CANDIDATE_COUNT)
        .map(|i| {
            let first = bank::FIRST_NAMES[rng.gen_range(0..bank::FIRST_NAMES.len())];
            let last = bank::LAST_NAMES[rng.gen_range(0..bank::LAST_NAMES.len())];
            let handle = format!("{first} {last}").to_lowercase();
            let skill_count = rng.gen_range(2..=5);
            let skills = bank::SKILLS
                .choose_multiple(rng, skill_count)
                .map(|s| s.to_string())
                .collect();

            Candidate {
                id: new_id(),
                name: format!("{first} {last}"),
                email: format!("{}@example.com", handle.replace(' ', ".")),
                job_id: jobs
                    .get(i % jobs.len().max(1))
                    .map(|j| j.id.clone())
                    .unwrap_or_default(),
                stage: CandidateStage::ALL[i % CandidateStage::ALL.len()],
                resume_url: Some(format!("https://example.com/resumes/{}.pdf", i + 1)),
                skills: Some(skills),
                address: Some(format!(
                    "{} {}, City {}",
                    rng.gen_range(100..1000),
                    bank::STREETS[i % bank::STREETS.len()],
                    1 + i % 20
                )),
                age: Some(rng.gen_range(20..=34)),
                experience: Some(rng.gen_range(1..=10)),
                linkedin: Some(format!(
                    "https://www.linkedin.com/in/{}",
                    handle.replace(' ', "-")
                )),
                gender: Some(bank::GENDERS[i % bank::GENDERS.len()].to_string()),
                created_at: now - Duration::days(rng.gen_range(0..60)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn classifies_titles_by_keyword() {
        assert_eq!(Role::classify("Senior SDE"), Role::Sde);
        assert_eq!(Role::classify("QA Engineer"), Role::Sde);
        assert_eq!(Role::classify("Data Scientist"), Role::Data);
        assert_eq!(Role::classify("Business Analyst"), Role::Data);
        assert_eq!(Role::classify("UI/UX Designer"), Role::Design);
        assert_eq!(Role::classify("HR Intern"), Role::Hr);
        assert_eq!(Role::classify("HR Specialist"), Role::Hr);
        assert_eq!(Role::classify("Recruiter"), Role::Design);
        assert_eq!(Role::classify("Growth Marketer"), Role::Sales);
        assert_eq!(Role::classify("Program Manager"), Role::General);
    }

    #[test]
    fn questions_cycle_archetypes_and_gate_the_last_one() {
        let questions = generate_questions("job1", 1, "Data Analyst");
        assert_eq!(questions.len(), QUESTIONS_PER_SECTION);

        let kinds = questions.iter().take(4).map(|q| q.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                QuestionType::LongText,
                QuestionType::ShortText,
                QuestionType::SingleChoice,
                QuestionType::MultiChoice
            ]
        );
        // (0 + 1) % 5 picks the second data prompt.
        assert_eq!(questions[0].label, bank::DATA_PROMPTS[1]);
        assert_eq!(questions[0].id, "job1-q-1-0");
        assert_eq!(questions[0].max_length, Some(1500));

        let rule = questions.last().and_then(|q| q.show_if.clone()).expect("showIf");
        assert_eq!(rule.question_id, "job1-q-1-0");
        assert_eq!(rule.equals, ShowIfValue::Text("A".into()));
        assert!(questions[..9].iter().all(|q| q.show_if.is_none()));
    }

    #[test]
    fn general_roles_draw_from_the_engineering_bank() {
        let questions = generate_questions("j", 0, "Technical Writer");
        assert_eq!(questions[0].label, bank::SDE_PROMPTS[0]);
    }

    #[test]
    fn dataset_shape_matches_fixed_counts() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = SeedDataset::generate(&mut rng, fixed_now());

        assert_eq!(data.jobs.len(), JOB_COUNT);
        let orders = data.jobs.iter().map(|j| j.order).collect::<Vec<_>>();
        assert_eq!(orders, (0..JOB_COUNT as u32).collect::<Vec<_>>());
        let slugs = data.jobs.iter().map(|j| j.slug.as_str()).collect::<HashSet<_>>();
        assert_eq!(slugs.len(), JOB_COUNT);
        assert_eq!(data.jobs[2].slug, "ui-ux-designer-3");
        assert_eq!(data.jobs[2].status, JobStatus::Archived);
        assert_eq!(data.jobs[4].status, JobStatus::Active);
        assert_eq!(data.jobs[3].deadline, Some(fixed_now() + Duration::days(10)));
        assert!(data.jobs[0].stipend.is_some());
        assert!(data.jobs[1].stipend.is_none());

        assert_eq!(data.assessments.len(), JOB_COUNT);
        for doc in &data.assessments {
            assert_eq!(doc.sections.len(), SECTIONS_PER_ASSESSMENT);
            assert!(doc.sections.iter().all(|s| s.questions.len() == QUESTIONS_PER_SECTION));
        }

        assert_eq!(data.candidates.len(), CANDIDATE_COUNT);
        for (i, c) in data.candidates.iter().enumerate() {
            assert_eq!(c.stage, CandidateStage::ALL[i % 6]);
            assert_eq!(c.job_id, data.jobs[i % JOB_COUNT].id);
            let skills = c.skills.as_ref().expect("skills");
            assert!((2..=5).contains(&skills.len()));
            assert_eq!(skills.iter().collect::<HashSet<_>>().len(), skills.len());
            assert!((20..=34).contains(&c.age.unwrap()));
            assert!((1..=10).contains(&c.experience.unwrap()));
            assert!(c.email.ends_with("@example.com"));
            assert_eq!(c.email, c.email.to_lowercase());
        }

        assert_eq!(data.timelines.len(), TIMELINE_CANDIDATES);
        for (event, c) in data.timelines.iter().zip(&data.candidates) {
            assert_eq!(event.candidate_id, c.id);
            assert_eq!(event.stage, Some(c.stage));
            assert_eq!(event.at, c.created_at + Duration::hours(1));
        }
    }

    #[tokio::test]
    async fn seeding_runs_once_per_store() {
        let store = Store::in_memory();
        let mut rng = StdRng::seed_from_u64(42);

        let first = ensure_seeded(&store, &mut rng).await.unwrap();
        let SeedOutcome::Seeded(summary) = first else {
            panic!("expected a fresh seed, got {first:?}");
        };
        assert_eq!(summary.candidates, CANDIDATE_COUNT);

        let second = ensure_seeded(&store, &mut rng).await.unwrap();
        assert_eq!(second, SeedOutcome::AlreadySeeded);

        let counts = store.read(|db| db.counts()).await;
        assert_eq!(counts.jobs, JOB_COUNT);
        assert_eq!(counts.assessments, JOB_COUNT);
        assert_eq!(counts.candidates, CANDIDATE_COUNT);
        assert_eq!(counts.timelines, TIMELINE_CANDIDATES);
    }
}
