//! End-to-end tests against a real browser.
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test --test integration -- --ignored

use formwright_tools::page::{Lookup, PageAdapter};
use formwright_tools::runner::{
    AnswerMap, BrowserConfig, Config, EokaPage, FieldOutcome, Transition, TransitionOutcome,
    WizardPhase,
};
use formwright_tools::{FieldDescriptor, FieldKind, FormSchema, Locator, Runner, Wizard};
use std::io::Write;

/// Check if Chrome is available
fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

fn headless() -> BrowserConfig {
    BrowserConfig {
        headless: true,
        ..Default::default()
    }
}

const APPLICATION: &str = concat!(
    "data:text/html,",
    "<label for=\"first\">First Name</label><input id=\"first\">",
    "<label for=\"last\">Last Name</label><input id=\"last\">",
    "<label for=\"country\">Country</label>",
    "<select id=\"country\"><option>France</option><option>United Kingdom</option></select>",
    "<label><input type=\"checkbox\" id=\"privacy\"> I agree to the Privacy Policy</label>",
    "<input type=\"file\" id=\"resume\" style=\"display:none\" ",
    "onchange=\"document.getElementById(`done`).textContent=this.files[0].name\">",
    "<div id=\"done\"></div>",
);

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_runner_fills_application() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut resume = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(".pdf")
        .tempfile()
        .expect("Failed to create resume");
    resume.write_all(b"%PDF-1.4").expect("Failed to write resume");

    let yaml = format!(
        r#"
name: "Local application"
target:
  url: '{}'
browser:
  headless: true
steps:
  - name: "Application"
    fields:
      - name: first_name
        kind: text
        locator: "label:First Name"
        required: true
      - name: last_name
        kind: text
        locator: "css:#last"
        required: true
      - name: country
        kind: static_dropdown
        locator: "label:Country"
      - name: privacy
        kind: checkbox
        locator: "role:checkbox=/Privacy Policy/"
      - name: resume
        kind: file_upload
        locator: "css:#resume"
"#,
        APPLICATION
    );
    let config = Config::parse(&yaml).expect("Failed to parse config");
    let answers = AnswerMap::new()
        .set("first_name", "Ada")
        .set("last_name", "Lovelace")
        .set("country", "United Kingdom")
        .set("privacy", true)
        .file("resume", resume.path());

    let runner = Runner::new(&config.browser)
        .await
        .expect("Failed to launch browser");
    let result = runner.run(&config, &answers).await.expect("Run failed");
    assert!(result.success, "{:?}", result.error);

    let page = EokaPage::new(runner.page());
    let first = match page.find(&Locator::parse("css:#first")).await.unwrap() {
        Lookup::Found(el) => el,
        other => panic!("Expected first name input, got {:?}", other),
    };
    assert_eq!(page.value(&first).await.unwrap(), "Ada");

    let fill = &result.report.steps[0].fill;
    assert_eq!(fill.outcome("resume"), Some(&FieldOutcome::Filled));

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_wizard_follows_transition() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let runner = Runner::new(&headless())
        .await
        .expect("Failed to launch browser");
    runner
        .page()
        .goto(concat!(
            "data:text/html,",
            "<label for=\"first\">First Name</label><input id=\"first\">",
            "<button onclick=\"document.getElementById(`exp`).hidden=false\">Save and Continue</button>",
            "<div id=\"exp\" hidden><h2>My Experience</h2>",
            "<label for=\"title\">Job Title</label><input id=\"title\"></div>",
        ))
        .await
        .expect("Failed to navigate");

    let steps = [
        FormSchema::new("My Information")
            .field(FieldDescriptor::new("first_name", FieldKind::Text, "label:First Name"))
            .with_transition(Transition::new(
                "role:button=Save and Continue",
                "role:heading=My Experience",
            )),
        FormSchema::new("My Experience")
            .field(FieldDescriptor::new("job_title", FieldKind::Text, "label:Job Title")),
    ];
    let answers = AnswerMap::new()
        .set("first_name", "Ada")
        .set("job_title", "Analyst");

    let page = EokaPage::new(runner.page());
    let report = Wizard::new(&page).run_shared(&steps, &answers).await;

    assert_eq!(report.phase, WizardPhase::Completed, "{:?}", report.error);
    assert_eq!(
        report.steps[0].transition,
        Some(TransitionOutcome::Confirmed)
    );

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_find_reports_ambiguity_and_hidden_elements() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let runner = Runner::new(&headless())
        .await
        .expect("Failed to launch browser");
    runner
        .page()
        .goto(concat!(
            "data:text/html,",
            "<button>Add</button><button>Add</button>",
            "<button style=\"display:none\">Remove</button>",
            "<input aria-label=\"Email\" placeholder=\"you@example.com\">",
        ))
        .await
        .expect("Failed to navigate");

    let page = EokaPage::new(runner.page());
    assert!(matches!(
        page.find(&Locator::parse("role:button=Add")).await.unwrap(),
        Lookup::Ambiguous(2)
    ));
    assert!(matches!(
        page.find(&Locator::parse("role:button=Remove")).await.unwrap(),
        Lookup::NotFound
    ));
    assert!(matches!(
        page.find(&Locator::parse("placeholder:you@example")).await.unwrap(),
        Lookup::Found(_)
    ));
    assert!(matches!(
        page.find(&Locator::parse("role:textbox=Email")).await.unwrap(),
        Lookup::Found(_)
    ));

    runner.close().await.expect("Failed to close browser");
}
