use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use paper_pulse::{
    notebook::summary_file_name, AudioSummary, AutomationError, PaperLink, Stage,
    SummaryGenerator, SummaryOutcome,
};

/// Writes a small file per link instead of driving a browser
#[derive(Clone, Default)]
pub struct MockSummaryGenerator {
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    /// Links that fail, with the stage they fail at
    pub failing: Vec<(String, Stage)>,
    /// Held after the files are written, before returning
    pub delay: Option<Duration>,
}

impl MockSummaryGenerator {
    pub fn failing(url: &str, stage: Stage) -> Self {
        Self {
            failing: vec![(url.to_string(), stage)],
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_all(urls: &[&str], stage: Stage) -> Self {
        Self {
            failing: urls.iter().map(|url| (url.to_string(), stage)).collect(),
            ..Default::default()
        }
    }
}

impl SummaryGenerator for MockSummaryGenerator {
    async fn produce_summaries(&self, links: &[PaperLink], out_dir: &Path) -> Vec<SummaryOutcome> {
        self.calls
            .lock()
            .unwrap()
            .push(links.iter().map(ToString::to_string).collect());

        let outcomes: Vec<SummaryOutcome> = links
            .iter()
            .enumerate()
            .map(|(index, link)| {
                let failure = self
                    .failing
                    .iter()
                    .find(|(url, _)| url == link.as_str())
                    .map(|(_, stage)| *stage);

                let result = match failure {
                    Some(stage) => Err(AutomationError::new(stage, link.clone(), "mock failure")),
                    None => {
                        let path = out_dir.join(summary_file_name(index));
                        let audio = format!("audio for {link}");
                        std::fs::write(&path, &audio).unwrap();
                        Ok(AudioSummary {
                            link: link.clone(),
                            index,
                            path,
                            size: audio.len() as u64,
                        })
                    }
                };

                SummaryOutcome {
                    link: link.clone(),
                    index,
                    result,
                }
            })
            .collect();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        outcomes
    }
}
