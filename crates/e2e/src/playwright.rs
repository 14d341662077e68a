//! Playwright-backed calculator driver
//!
//! Each session records the page actions issued by the runner. Whenever a
//! value has to be read, the recorded actions are replayed in a fresh headless
//! browser by a generated Node script, which prints the read value as a JSON
//! line on stdout. The calculator page is deterministic, so replaying from
//! `navigate` reproduces the exact on-screen state without keeping a browser
//! alive between reads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use calcmatrix_common::{BuildVariant, Operand, Operator};

use crate::driver::{CalculatorDriver, DriverFactory};
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// CSS selectors of the calculator page elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    pub build: String,
    pub number1: String,
    pub number2: String,
    pub operation: String,
    pub calculate: String,
    pub answer: String,
    pub error_message: String,
    pub integer_only: String,
    pub clear: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            build: "#selectBuild".to_string(),
            number1: "#number1Field".to_string(),
            number2: "#number2Field".to_string(),
            operation: "#selectOperationDropdown".to_string(),
            calculate: "#calculateButton".to_string(),
            answer: "#numberAnswerField".to_string(),
            error_message: "#errorMsgField".to_string(),
            integer_only: "#integerSelect".to_string(),
            clear: "#clearButton".to_string(),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    /// URL of the calculator page
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,

    /// Node executable used to run generated scripts
    pub node_binary: PathBuf,

    /// `NODE_PATH` for resolving the `playwright` package
    /// (defaults to `./node_modules`)
    pub node_path: Option<PathBuf>,

    /// Default timeout for each page action
    pub action_timeout_ms: u64,

    pub selectors: PageSelectors,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://testsheepnz.github.io/BasicCalculator.html".to_string(),
            browser: Browser::Chromium,
            headless: true,
            node_binary: PathBuf::from("node"),
            node_path: None,
            action_timeout_ms: 5000,
            selectors: PageSelectors::default(),
        }
    }
}

/// A recorded page action, replayed before every read
#[derive(Debug, Clone, PartialEq)]
enum PageAction {
    Navigate,
    SelectBuild(String),
    EnterOperation {
        a: String,
        b: String,
        operator: Operator,
    },
    ToggleIntegerOnly,
    Clear,
}

impl PageAction {
    /// Fixed label for script comments; never carries operand text
    fn kind(&self) -> &'static str {
        match self {
            PageAction::Navigate => "navigate",
            PageAction::SelectBuild(_) => "select build",
            PageAction::EnterOperation { .. } => "enter operation",
            PageAction::ToggleIntegerOnly => "toggle integer only",
            PageAction::Clear => "clear",
        }
    }

    fn name(&self) -> String {
        match self {
            PageAction::Navigate => "navigate".to_string(),
            PageAction::SelectBuild(build) => format!("select build {}", build),
            PageAction::EnterOperation { a, b, operator } => {
                format!("enter {} {} {}", a, operator.symbol(), b)
            }
            PageAction::ToggleIntegerOnly => "toggle integer only".to_string(),
            PageAction::Clear => "clear".to_string(),
        }
    }
}

/// Value read back at the end of a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageQuery {
    Result,
    ErrorMessage,
}

impl PageQuery {
    fn name(&self) -> &'static str {
        match self {
            PageQuery::Result => "read result",
            PageQuery::ErrorMessage => "read error message",
        }
    }
}

/// JSON line printed by a generated script
#[derive(Debug, Clone, Deserialize)]
struct ScriptOutput {
    success: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Opens [`PlaywrightSession`]s
pub struct PlaywrightFactory {
    config: PlaywrightConfig,
}

impl PlaywrightFactory {
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        check_playwright_installed()?;
        Ok(Self { config })
    }
}

#[async_trait]
impl DriverFactory for PlaywrightFactory {
    async fn open(&self) -> E2eResult<Box<dyn CalculatorDriver>> {
        Ok(Box::new(PlaywrightSession::new(self.config.clone())))
    }
}

/// Check if Playwright is installed
fn check_playwright_installed() -> E2eResult<()> {
    let output = Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match output {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

/// Playwright browser session for one test case
pub struct PlaywrightSession {
    config: PlaywrightConfig,
    actions: Vec<PageAction>,
}

impl PlaywrightSession {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self {
            config,
            actions: Vec::new(),
        }
    }

    /// Build the Playwright script replaying every action, then reading `query`
    pub fn build_script(&self, query: PageQuery) -> String {
        let mut script = String::new();

        // Header
        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const page = await browser.newPage();
  page.setDefaultTimeout({timeout});

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            timeout = self.config.action_timeout_ms,
        ));

        for (i, action) in self.actions.iter().enumerate() {
            script.push_str(&format!("\n    // Action {}: {}\n", i + 1, action.kind()));
            script.push_str(&self.action_to_js(action));
            script.push('\n');
        }

        let selectors = &self.config.selectors;
        let read = match query {
            PageQuery::Result => format!("await page.inputValue({})", js_str(&selectors.answer)),
            PageQuery::ErrorMessage => format!(
                "(await page.textContent({})) ?? ''",
                js_str(&selectors.error_message)
            ),
        };
        script.push_str(&format!(
            "\n    // Query: {}\n    const value = {};\n",
            query.name(),
            read
        ));

        // Footer
        script.push_str(
            r#"    console.log(JSON.stringify({ success: true, value }));
  } catch (error) {
    console.log(JSON.stringify({ success: false, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Convert an action to JavaScript code
    fn action_to_js(&self, action: &PageAction) -> String {
        let s = &self.config.selectors;
        match action {
            PageAction::Navigate => {
                format!("    await page.goto({});", js_str(&self.config.base_url))
            }
            PageAction::SelectBuild(build) => format!(
                "    await page.selectOption({}, {{ label: {} }});",
                js_str(&s.build),
                js_str(build)
            ),
            PageAction::EnterOperation { a, b, operator } => [
                format!("    await page.fill({}, {});", js_str(&s.number1), js_str(a)),
                format!("    await page.fill({}, {});", js_str(&s.number2), js_str(b)),
                format!(
                    "    await page.selectOption({}, {{ label: {} }});",
                    js_str(&s.operation),
                    js_str(operator.label())
                ),
                format!("    await page.click({});", js_str(&s.calculate)),
            ]
            .join("\n"),
            PageAction::ToggleIntegerOnly => {
                format!("    await page.click({});", js_str(&s.integer_only))
            }
            PageAction::Clear => format!("    await page.click({});", js_str(&s.clear)),
        }
    }

    /// Execute the full script via Playwright, returning stdout
    async fn run_script(&self, script: &str) -> E2eResult<String> {
        // Write script to temp file
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("calc.js");
        std::fs::write(&script_path, script)?;

        let node_path = match &self.config.node_path {
            Some(path) => path.clone(),
            None => std::env::current_dir()?.join("node_modules"),
        };

        debug!("Running Playwright script: {}", script_path.display());

        let output = TokioCommand::new(&self.config.node_binary)
            .arg(&script_path)
            .current_dir(temp_dir.path())
            .env("NODE_PATH", node_path)
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() && find_output(&stdout).is_none() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(stdout)
    }

    async fn query(&self, query: PageQuery) -> E2eResult<String> {
        let script = self.build_script(query);
        let stdout = self.run_script(&script).await?;
        parse_output(query, &stdout)
    }

    fn record(&mut self, action: PageAction) {
        debug!("Recording action: {}", action.name());
        self.actions.push(action);
    }
}

#[async_trait]
impl CalculatorDriver for PlaywrightSession {
    async fn navigate(&mut self) -> E2eResult<()> {
        // A fresh page forgets everything done before
        self.actions.clear();
        self.record(PageAction::Navigate);
        Ok(())
    }

    async fn select_build(&mut self, build: &BuildVariant) -> E2eResult<()> {
        self.record(PageAction::SelectBuild(build.id().to_string()));
        Ok(())
    }

    async fn enter_operation(&mut self, a: &Operand, b: &Operand, operator: Operator) -> E2eResult<()> {
        self.record(PageAction::EnterOperation {
            a: a.to_input(),
            b: b.to_input(),
            operator,
        });
        Ok(())
    }

    async fn read_result(&mut self) -> E2eResult<String> {
        self.query(PageQuery::Result).await
    }

    async fn read_error_message(&mut self) -> E2eResult<String> {
        self.query(PageQuery::ErrorMessage).await
    }

    async fn toggle_integer_only(&mut self) -> E2eResult<()> {
        self.record(PageAction::ToggleIntegerOnly);
        Ok(())
    }

    async fn clear(&mut self) -> E2eResult<()> {
        self.record(PageAction::Clear);
        Ok(())
    }
}

/// Quote a string as a JavaScript string literal
///
/// JSON leaves U+2028 and U+2029 raw, which older JS engines treat as line
/// terminators inside literals.
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Last JSON output line of a script run
fn find_output(stdout: &str) -> Option<ScriptOutput> {
    stdout
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str::<ScriptOutput>(line.trim()).ok())
}

fn parse_output(query: PageQuery, stdout: &str) -> E2eResult<String> {
    let output = find_output(stdout).ok_or_else(|| {
        E2eError::Playwright(format!("no result line in script output: {}", stdout.trim()))
    })?;

    if output.success {
        Ok(output.value.unwrap_or_default())
    } else {
        Err(E2eError::Driver {
            action: query.name().to_string(),
            reason: output.error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}
