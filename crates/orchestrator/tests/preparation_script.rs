//! Runs generated preparation scripts against a minimal page stub in node.
//!
//! Skipped when `node` is not installed.

use std::process::Command;

use framecast_capture_engine::{CaptureEngine, CommandEngine};
use framecast_orchestrator::script::{
    build_preparation_script, ReadinessOptions, PAGE_NOT_READY_MARKER,
};

const PAGE_STUB: &str = r##"
class FakeElement {
  constructor(id) { this.id = id; this.attached = true; this.removals = 0; }
  remove() { this.attached = false; this.removals += 1; }
}
const nodes = [];
const observers = [];
globalThis.window = globalThis;
globalThis.document = {
  documentElement: { nodeName: "HTML" },
  querySelectorAll(selector) {
    return nodes.filter((n) => n.attached && "#" + n.id === selector);
  },
};
globalThis.MutationObserver = class {
  constructor(callback) { this.callback = callback; observers.push(this); }
  observe(target, options) { this.target = target; this.options = options; }
};
const exportBtn = new FakeElement("exportBtn");
const stage = new FakeElement("stage");
nodes.push(exportBtn, stage);
const report = (value) => console.log(JSON.stringify(value));
"##;

fn node_available() -> bool {
    let available = CommandEngine::new("node", Vec::new()).is_available();
    if !available {
        eprintln!("node not found; skipping page script execution test");
    }
    available
}

/// Run `scenario` with `__PREPARE__` replaced by an async function that
/// executes `script`. Returns the last JSON line the scenario printed.
fn run_in_page(script: &str, scenario: &str) -> serde_json::Value {
    let prepare = format!("async () => {{\n{script}\n}}");
    let program = format!("{PAGE_STUB}\n{}", scenario.replace("__PREPARE__", &prepare));
    let output = Command::new("node").arg("-e").arg(&program).output().unwrap();
    assert!(
        output.status.success(),
        "node failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    let last = stdout.lines().last().unwrap_or_default();
    serde_json::from_str(last).unwrap()
}

fn fast_readiness(timeout_ms: u64) -> ReadinessOptions {
    ReadinessOptions {
        timeout_ms,
        poll_interval_ms: 20,
    }
}

#[test]
fn waits_for_timeline_then_removes_hidden_element() {
    if !node_available() {
        return;
    }
    let script = build_preparation_script("tl", Some("#exportBtn"), &fast_readiness(5_000));

    let result = run_in_page(
        &script,
        r#"
        const started = Date.now();
        setTimeout(() => { window.tl = { duration: 3 }; }, 150);
        (__PREPARE__)().then(() => {
          const first = {
            waitedMs: Date.now() - started,
            removed: !exportBtn.attached,
            stageKept: stage.attached,
            observers: observers.length,
            options: observers[0] && observers[0].options,
          };
          exportBtn.attached = true;
          observers.forEach((o) => o.callback([]));
          report({ ...first, removedAgain: !exportBtn.attached, removals: exportBtn.removals });
        }, (e) => report({ error: String(e && e.message) }));
        "#,
    );

    assert!(result.get("error").is_none(), "{result}");
    assert!(result["waitedMs"].as_u64().unwrap() >= 100);
    assert_eq!(result["removed"], true);
    assert_eq!(result["stageKept"], true);
    assert_eq!(result["observers"], 1);
    assert_eq!(result["options"]["childList"], true);
    assert_eq!(result["options"]["subtree"], true);
    assert_eq!(result["removedAgain"], true);
    assert_eq!(result["removals"], 2);
}

#[test]
fn missing_timeline_rejects_with_marker() {
    if !node_available() {
        return;
    }
    let script = build_preparation_script("tl", Some("#exportBtn"), &fast_readiness(200));

    let result = run_in_page(
        &script,
        r#"
        const started = Date.now();
        (__PREPARE__)().then(
          () => report({ resolved: true }),
          (e) => report({
            error: String(e && e.message),
            elapsedMs: Date.now() - started,
            buttonStillThere: exportBtn.attached,
          }),
        );
        "#,
    );

    let error = result["error"].as_str().unwrap();
    assert!(error.starts_with(PAGE_NOT_READY_MARKER), "{error}");
    assert!(error.contains("timeline \"tl\" was not found"));
    assert!(result["elapsedMs"].as_u64().unwrap() >= 200);
    assert_eq!(result["buttonStillThere"], true);
}

#[test]
fn no_hide_selector_leaves_dom_untouched() {
    if !node_available() {
        return;
    }
    let script = build_preparation_script("tl", None, &fast_readiness(1_000));

    let result = run_in_page(
        &script,
        r#"
        window.tl = {};
        (__PREPARE__)().then(
          () => report({ buttonKept: exportBtn.attached, observers: observers.length }),
          (e) => report({ error: String(e && e.message) }),
        );
        "#,
    );

    assert_eq!(result["buttonKept"], true);
    assert_eq!(result["observers"], 0);
}

#[test]
fn hostile_values_stay_data() {
    if !node_available() {
        return;
    }
    let script = build_preparation_script(
        "tl",
        Some("#x'); globalThis.pwned = true; //</script>"),
        &fast_readiness(1_000),
    );

    let result = run_in_page(
        &script,
        r#"
        window.tl = {};
        (__PREPARE__)().then(
          () => report({ pwned: globalThis.pwned === true, buttonKept: exportBtn.attached }),
          (e) => report({ error: String(e && e.message) }),
        );
        "#,
    );

    assert!(result.get("error").is_none(), "{result}");
    assert_eq!(result["pwned"], false);
    assert_eq!(result["buttonKept"], true);
}
