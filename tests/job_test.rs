use chrono::{TimeZone, Utc};
use jobmail::config::{Config, GmailConfig, JobConfig, PassConfig, SchedulerConfig, StoreConfig};
use jobmail::email::{MailMessage, SkipReason};
use jobmail::job::{run_job, JobProcessor};
use jobmail::mailbox::InMemoryMailbox;
use jobmail::sheets::{self, CellValue, InMemoryWorkbook, SheetError};

const CONFIRMATION_QUERY: &str = "\"Thank you for applying\" OR \"received your application\"";
const ACTION_QUERY: &str = "(interview OR assessment) AND (schedule OR availability)";

fn job_config() -> JobConfig {
    JobConfig {
        spreadsheet_id: "test-workbook".to_string(),
        confirmation: PassConfig {
            sheet_name: "Email Data".to_string(),
            label_name: "Applied".to_string(),
            search_query: CONFIRMATION_QUERY.to_string(),
        },
        action: PassConfig {
            sheet_name: "Actionable Jobs".to_string(),
            label_name: "Action Required: Follow Up".to_string(),
            search_query: ACTION_QUERY.to_string(),
        },
        action_keywords: vec![
            "interview".to_string(),
            "assessment".to_string(),
            "schedule".to_string(),
        ],
    }
}

fn message(id: &str, from: &str, subject: &str, body: &str) -> MailMessage {
    MailMessage {
        id: id.to_string(),
        date: Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap(),
        from: from.to_string(),
        subject: subject.to_string(),
        plain_body: body.to_string(),
    }
}

/// 2 confirmation threads; 3 action threads, one already labeled and one without keyword
fn scenario_mailbox() -> InMemoryMailbox {
    InMemoryMailbox::new()
        .with_thread("c1", vec![
            message("c1-m1", "\"Acme Careers\" <careers@acme.io>", "Thank you for applying", "We got it."),
            message("c1-m2", "me@example.com", "Re: Thank you for applying", "Thanks!"),
        ])
        .with_thread("c2", vec![
            message("c2-m1", "Globex HR <hr@globex.com>", "Application received", "We received your application."),
        ])
        .with_thread("a1", vec![
            message("a1-m1", "Jane Recruiter <jane@initech.com>", "Interview", "Let's schedule your interview."),
        ])
        .with_thread("a2", vec![
            message("a2-m1", "noreply@jobs.example", "Your availability", "Thanks for updating your profile."),
        ])
        .with_thread("a3", vec![
            message("a3-m1", "bob@umbrella.com", "Assessment", "Please complete the assessment."),
        ])
        .with_thread_label("a3", "Action Required: Follow Up")
        .with_search(CONFIRMATION_QUERY, &["c1", "c2"])
        .with_search(ACTION_QUERY, &["a1", "a2", "a3"])
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let mailbox = scenario_mailbox();
    let workbook = InMemoryWorkbook::new("test-workbook");
    let processor = JobProcessor::new(&job_config());

    let report = processor.run(&mailbox, &workbook).await.expect("run failed");

    // Confirmation table: header + 2 rows from the first message of each thread
    let confirmation_rows = workbook.rows("Email Data").await;
    assert_eq!(confirmation_rows.len(), 3);
    assert_eq!(confirmation_rows[0][0], CellValue::from("Date"));
    assert_eq!(confirmation_rows[1][1], CellValue::from("Acme Careers"));
    assert_eq!(confirmation_rows[1][2], CellValue::from("Thank you for applying"));
    assert_eq!(confirmation_rows[1][3], CellValue::from("c1"));
    assert_eq!(confirmation_rows[2][1], CellValue::from("Globex HR"));

    // Action table: header + the single thread with a body keyword
    let action_rows = workbook.rows("Actionable Jobs").await;
    assert_eq!(action_rows.len(), 2);
    assert_eq!(action_rows[0][3], CellValue::from("Action Keyword Found"));
    assert_eq!(action_rows[1][1], CellValue::from("Jane Recruiter"));
    assert_eq!(action_rows[1][3], CellValue::from("interview"));
    assert_eq!(action_rows[1][5], CellValue::from("Let's schedule your interview."));

    assert_eq!(report.confirmation.rows_logged, 2);
    assert_eq!(report.confirmation.labeled, 2);
    assert_eq!(report.action.threads_found, 3);
    assert_eq!(report.action.labeled, 1);
    assert_eq!(report.action.skipped_for(SkipReason::AlreadyLabeled), 1);
    assert_eq!(report.action.skipped_for(SkipReason::NoKeyword), 1);

    assert!(mailbox.thread_labels("c1").await.contains(&"Applied".to_string()));
    assert!(mailbox.thread_labels("a1").await.contains(&"Action Required: Follow Up".to_string()));
    assert!(!mailbox.thread_labels("a2").await.contains(&"Action Required: Follow Up".to_string()));
}

#[tokio::test]
async fn test_second_run_logs_no_new_action_rows() {
    let mailbox = scenario_mailbox();
    let workbook = InMemoryWorkbook::new("test-workbook");
    let processor = JobProcessor::new(&job_config());

    processor.run(&mailbox, &workbook).await.unwrap();
    let second = processor.run(&mailbox, &workbook).await.unwrap();

    assert_eq!(second.action.labeled, 0);
    assert_eq!(second.action.rows_logged, 0);
    assert_eq!(second.action.skipped_for(SkipReason::AlreadyLabeled), 2);
    assert_eq!(workbook.rows("Actionable Jobs").await.len(), 1);

    // Confirmations are relabeled and relogged every run, never accumulated
    assert_eq!(second.confirmation.rows_logged, 2);
    assert_eq!(workbook.rows("Email Data").await.len(), 3);
    assert_eq!(mailbox.thread_labels("c1").await, vec!["Applied".to_string()]);
}

#[tokio::test]
async fn test_tables_only_hold_current_run() {
    let workbook = InMemoryWorkbook::new("test-workbook");
    let processor = JobProcessor::new(&job_config());

    processor.run(&scenario_mailbox(), &workbook).await.unwrap();
    assert_eq!(workbook.rows("Email Data").await.len(), 3);

    // Mailbox where nothing matches anymore
    let empty = InMemoryMailbox::new();
    let report = processor.run(&empty, &workbook).await.unwrap();

    assert_eq!(report.confirmation.threads_found, 0);
    assert_eq!(workbook.rows("Email Data").await.len(), 1);
    assert_eq!(workbook.rows("Actionable Jobs").await.len(), 1);
}

#[tokio::test]
async fn test_threads_without_messages_are_skipped() {
    let mailbox = InMemoryMailbox::new()
        .with_thread("empty-c", vec![])
        .with_thread("empty-a", vec![])
        .with_search(CONFIRMATION_QUERY, &["empty-c"])
        .with_search(ACTION_QUERY, &["empty-a"]);
    let workbook = InMemoryWorkbook::new("test-workbook");

    let report = JobProcessor::new(&job_config()).run(&mailbox, &workbook).await.unwrap();

    assert_eq!(report.confirmation.skipped_for(SkipReason::NoMessages), 1);
    assert_eq!(report.action.skipped_for(SkipReason::NoMessages), 1);
    assert_eq!(workbook.rows("Email Data").await.len(), 1);
    assert!(mailbox.thread_labels("empty-c").await.is_empty());
}

#[tokio::test]
async fn test_repeated_search_result_is_handled_once() {
    let mailbox = InMemoryMailbox::new()
        .with_thread("c1", vec![
            message("c1-m1", "careers@acme.io", "Thank you for applying", "We got it."),
        ])
        .with_thread("a1", vec![
            message("a1-m1", "Jane Recruiter <jane@initech.com>", "Interview", "Let's schedule your interview."),
        ])
        .with_search(CONFIRMATION_QUERY, &["c1", "c1"])
        .with_search(ACTION_QUERY, &["a1", "a1"]);
    let workbook = InMemoryWorkbook::new("test-workbook");

    let report = JobProcessor::new(&job_config()).run(&mailbox, &workbook).await.unwrap();

    assert_eq!(report.action.threads_found, 2);
    assert_eq!(report.action.labeled, 1);
    assert_eq!(report.action.rows_logged, 1);
    assert_eq!(report.action.skipped_for(SkipReason::Duplicate), 1);
    assert_eq!(workbook.rows("Actionable Jobs").await.len(), 2);

    assert_eq!(report.confirmation.labeled, 1);
    assert_eq!(workbook.rows("Email Data").await.len(), 2);
}

#[tokio::test]
async fn test_labels_created_on_first_use() {
    let mailbox = scenario_mailbox();
    let workbook = InMemoryWorkbook::new("test-workbook");

    JobProcessor::new(&job_config()).run(&mailbox, &workbook).await.unwrap();

    let labels = mailbox.label_names().await;
    assert!(labels.contains(&"Applied".to_string()));
    assert_eq!(labels.iter().filter(|l| *l == "Action Required: Follow Up").count(), 1);
}

#[tokio::test]
async fn test_dry_run_leaves_mailbox_untouched() {
    let mailbox = scenario_mailbox();

    let report = JobProcessor::new(&job_config()).run_dry_run(&mailbox).await.unwrap();

    assert_eq!(report.confirmation.rows_logged, 2);
    assert_eq!(report.action.rows_logged, 1);
    assert_eq!(report.action.labeled, 0);
    assert!(mailbox.thread_labels("c1").await.is_empty());
    assert!(!mailbox.label_names().await.contains(&"Applied".to_string()));
}

#[tokio::test]
async fn test_missing_workbook_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreConfig::Csv {
        sheets_dir: dir.path().to_str().unwrap().to_string(),
    };

    let err = sheets::open_workbook(&store, "does-not-exist").await.err().unwrap();

    assert!(matches!(
        err.downcast_ref::<SheetError>(),
        Some(SheetError::WorkbookNotFound(_))
    ));
}

#[tokio::test]
async fn test_run_job_aborts_on_missing_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        gmail: GmailConfig {
            // Never read: the workbook is opened before Gmail
            credentials_path: dir.path().join("missing-credentials.json").to_str().unwrap().to_string(),
            token_cache_path: dir.path().join("token.json").to_str().unwrap().to_string(),
            max_threads: 500,
        },
        store: StoreConfig::Csv {
            sheets_dir: dir.path().to_str().unwrap().to_string(),
        },
        scheduler: SchedulerConfig {
            enabled: false,
            schedule_times: vec![],
        },
        job: job_config(),
    };

    let err = run_job(&config, false).await.err().unwrap();

    assert!(matches!(
        err.downcast_ref::<SheetError>(),
        Some(SheetError::WorkbookNotFound(id)) if id == "test-workbook"
    ));
    assert!(!dir.path().join("test-workbook").exists());
    assert!(!dir.path().join("token.json").exists());
}

#[tokio::test]
async fn test_run_against_csv_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreConfig::Csv {
        sheets_dir: dir.path().to_str().unwrap().to_string(),
    };
    sheets::create_workbook(&store, "test-workbook").await.unwrap();
    let workbook = sheets::open_workbook(&store, "test-workbook").await.unwrap();

    JobProcessor::new(&job_config())
        .run(&scenario_mailbox(), workbook.as_ref())
        .await
        .unwrap();

    let actions = std::fs::read_to_string(dir.path().join("test-workbook").join("Actionable Jobs.csv")).unwrap();
    let mut lines = actions.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Sender Name,Subject,Action Keyword Found,Full From,Message Body")
    );
    assert_eq!(
        lines.next(),
        Some("2025-04-10T09:00:00+00:00,Jane Recruiter,Interview,interview,Jane Recruiter <jane@initech.com>,Let's schedule your interview.")
    );
    assert_eq!(lines.next(), None);
}
