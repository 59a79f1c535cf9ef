use crate::error::Result;
use crate::result::{ProbeOutcome, ReachabilityReport};
use futures::future::join_all;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

/// Browser user agent sent with every probe. Some sites refuse unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_6) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/53.0.2785.143 \
     Safari/537.36";

/// Statuses counted as reachable. 999 is what some origins answer to bots.
pub const DEFAULT_ACCEPTED_STATUSES: [u16; 2] = [200, 999];

pub const DEFAULT_CONCURRENCY: usize = 50;

pub type ProbeCallback = Arc<dyn Fn(String, ProbeOutcome) + Send + Sync>;

/// Build the HTTP client shared by page fetches and probes.
pub fn build_client(user_agent: &str, timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(user_agent)
        .pool_max_idle_per_host(50)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout).connect_timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Checks external links for reachability, one GET per link, no retries.
///
/// Probes run concurrently behind a semaphore. Without a deadline the call
/// waits for every probe; with one, probes still running when it expires are
/// aborted and reported as failed.
pub struct Prober {
    client: Client,
    accepted_statuses: Arc<Vec<u16>>,
    concurrency: usize,
    deadline: Option<Duration>,
    probe_callback: Option<ProbeCallback>,
}

impl Prober {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            accepted_statuses: Arc::new(DEFAULT_ACCEPTED_STATUSES.to_vec()),
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
            probe_callback: None,
        }
    }

    pub fn with_accepted_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.accepted_statuses = Arc::new(statuses);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_probe_callback(mut self, callback: ProbeCallback) -> Self {
        self.probe_callback = Some(callback);
        self
    }

    pub async fn probe(&self, links: &[String]) -> ReachabilityReport {
        if links.is_empty() {
            return ReachabilityReport::default();
        }

        info!(
            "Probing {} external links ({} at a time)",
            links.len(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let settled = Arc::new(Mutex::new(Settlement::with_capacity(links.len())));

        let mut handles = Vec::with_capacity(links.len());
        for (index, url) in links.iter().enumerate() {
            let client = self.client.clone();
            let accepted = self.accepted_statuses.clone();
            let semaphore = semaphore.clone();
            let settled = settled.clone();
            let callback = self.probe_callback.clone();
            let url = url.clone();

            let handle = tokio::spawn(async move {
                let outcome = match semaphore.acquire().await {
                    Ok(_permit) => probe_link(&client, &url, &accepted).await,
                    Err(e) => ProbeOutcome::Errored(e.to_string()),
                };

                debug!("Probe {} -> {:?}", url, outcome);
                if !settled.lock().await.record(index, outcome.clone()) {
                    debug!("Discarding late outcome for {}", url);
                    return;
                }

                if let Some(ref callback) = callback {
                    callback(url, outcome);
                }
            });

            handles.push(handle);
        }

        let wait = join_all(handles.iter_mut());
        let results = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, wait).await.ok(),
            None => Some(wait.await),
        };

        let expired = match results {
            Some(results) => {
                for result in results {
                    if let Err(e) = result {
                        warn!("Probe task failed: {}", e);
                    }
                }
                false
            }
            None => {
                warn!(
                    "Probe deadline of {:?} expired, abandoning unfinished probes",
                    self.deadline.unwrap_or_default()
                );
                for handle in &handles {
                    handle.abort();
                }
                true
            }
        };

        // Closing refuses outcomes from tasks the abort did not reach in time,
        // so every link is reported to the callback exactly once.
        let mut outcomes = settled.lock().await.close();
        let seen: HashSet<usize> = outcomes.iter().map(|(index, _)| *index).collect();

        for index in (0..links.len()).filter(|index| !seen.contains(index)) {
            let outcome = if expired {
                ProbeOutcome::Abandoned
            } else {
                ProbeOutcome::Errored("probe task did not complete".to_string())
            };
            if let Some(ref callback) = self.probe_callback {
                callback(links[index].clone(), outcome.clone());
            }
            outcomes.push((index, outcome));
        }

        let failed: Vec<String> = outcomes
            .into_iter()
            .filter(|(_, outcome)| !outcome.is_reachable())
            .map(|(index, _)| links[index].clone())
            .collect();

        info!(
            "Probed {} external links, {} failed",
            links.len(),
            failed.len()
        );

        ReachabilityReport {
            checked: links.len(),
            failed,
        }
    }
}

/// Probe outcomes as `(index, outcome)` in completion order.
#[derive(Debug, Default)]
struct Settlement {
    outcomes: Vec<(usize, ProbeOutcome)>,
    closed: bool,
}

impl Settlement {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
            closed: false,
        }
    }

    /// False once the settlement is closed; the outcome is then discarded.
    fn record(&mut self, index: usize, outcome: ProbeOutcome) -> bool {
        if self.closed {
            return false;
        }
        self.outcomes.push((index, outcome));
        true
    }

    fn close(&mut self) -> Vec<(usize, ProbeOutcome)> {
        self.closed = true;
        std::mem::take(&mut self.outcomes)
    }
}

async fn probe_link(client: &Client, url: &str, accepted: &[u16]) -> ProbeOutcome {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            if accepted.contains(&status) {
                ProbeOutcome::Reachable(status)
            } else {
                ProbeOutcome::Rejected(status)
            }
        }
        Err(e) if e.is_timeout() => ProbeOutcome::Errored(format!("timed out: {}", e)),
        Err(e) => ProbeOutcome::Errored(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn test_client() -> Client {
        build_client(DEFAULT_USER_AGENT, Some(Duration::from_secs(5))).unwrap()
    }

    fn as_set(urls: &[String]) -> HashSet<String> {
        urls.iter().cloned().collect()
    }

    async fn mount_status(server: &MockServer, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_empty_input() {
        let prober = Prober::new(test_client());
        let report = prober.probe(&[]).await;
        assert_eq!(report.checked, 0);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_failed_set_matches_erroring_subset() {
        let mock_server = MockServer::start().await;

        for i in 0..10 {
            let status = if i % 3 == 0 { 500 } else { 200 };
            mount_status(&mock_server, &format!("/link{}", i), status).await;
        }

        let links: Vec<String> = (0..10)
            .map(|i| format!("{}/link{}", mock_server.uri(), i))
            .collect();
        let expected: HashSet<String> = (0..10)
            .filter(|i| i % 3 == 0)
            .map(|i| format!("{}/link{}", mock_server.uri(), i))
            .collect();

        let prober = Prober::new(test_client()).with_concurrency(4);
        let report = prober.probe(&links).await;

        assert_eq!(report.checked, 10);
        assert_eq!(as_set(&report.failed), expected);
        assert_eq!(report.succeeded(), 6);
        assert!(as_set(&report.failed).is_subset(&as_set(&links)));
    }

    #[tokio::test]
    async fn test_only_200_and_999_are_reachable() {
        let mock_server = MockServer::start().await;
        mount_status(&mock_server, "/ok", 200).await;
        mount_status(&mock_server, "/bot", 999).await;
        mount_status(&mock_server, "/created", 201).await;
        mount_status(&mock_server, "/missing", 404).await;
        mount_status(&mock_server, "/busy", 429).await;

        let links: Vec<String> = ["/ok", "/bot", "/created", "/missing", "/busy"]
            .iter()
            .map(|p| format!("{}{}", mock_server.uri(), p))
            .collect();

        let report = Prober::new(test_client()).probe(&links).await;

        let expected: HashSet<String> = ["/created", "/missing", "/busy"]
            .iter()
            .map(|p| format!("{}{}", mock_server.uri(), p))
            .collect();
        assert_eq!(as_set(&report.failed), expected);
    }

    #[tokio::test]
    async fn test_accepted_statuses_are_configurable() {
        let mock_server = MockServer::start().await;
        mount_status(&mock_server, "/busy", 429).await;

        let links = vec![format!("{}/busy", mock_server.uri())];
        let report = Prober::new(test_client())
            .with_accepted_statuses(vec![200, 429, 999])
            .probe(&links)
            .await;

        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_user_agent_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ua"))
            .and(|request: &wiremock::Request| {
                request
                    .headers
                    .get("user-agent")
                    .and_then(|value| value.to_str().ok())
                    == Some(DEFAULT_USER_AGENT)
            })
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let links = vec![format!("{}/ua", mock_server.uri())];
        let report = Prober::new(test_client()).probe(&links).await;
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_transport_errors_fail() {
        // Nothing listens on port 9 on loopback
        let links = vec![
            "http://127.0.0.1:9/".to_string(),
            "//cdn.other.test/lib.js".to_string(),
        ];
        let report = Prober::new(test_client()).probe(&links).await;
        assert_eq!(as_set(&report.failed), as_set(&links));
    }

    #[tokio::test]
    async fn test_duplicate_links_are_probed_separately() {
        let mock_server = MockServer::start().await;
        mount_status(&mock_server, "/gone", 410).await;

        let link = format!("{}/gone", mock_server.uri());
        let links = vec![link.clone(), link.clone()];
        let report = Prober::new(test_client()).probe(&links).await;

        assert_eq!(report.checked, 2);
        assert_eq!(report.failed, vec![link.clone(), link]);
    }

    #[tokio::test]
    async fn test_deadline_abandons_slow_probes() {
        let mock_server = MockServer::start().await;
        mount_status(&mock_server, "/fast", 200).await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let fast = format!("{}/fast", mock_server.uri());
        let slow = format!("{}/slow", mock_server.uri());

        let abandoned = Arc::new(StdMutex::new(Vec::new()));
        let abandoned_clone = abandoned.clone();

        let prober = Prober::new(test_client())
            .with_deadline(Some(Duration::from_millis(500)))
            .with_probe_callback(Arc::new(move |url, outcome| {
                if outcome == ProbeOutcome::Abandoned {
                    abandoned_clone.lock().unwrap().push(url);
                }
            }));

        let report = prober.probe(&[fast, slow.clone()]).await;

        assert_eq!(report.checked, 2);
        assert_eq!(report.failed, vec![slow.clone()]);
        assert_eq!(*abandoned.lock().unwrap(), vec![slow]);
    }

    #[test]
    fn test_closed_settlement_refuses_outcomes() {
        let mut settlement = Settlement::with_capacity(2);
        assert!(settlement.record(0, ProbeOutcome::Reachable(200)));

        let snapshot = settlement.close();
        assert_eq!(snapshot, vec![(0, ProbeOutcome::Reachable(200))]);

        assert!(!settlement.record(1, ProbeOutcome::Reachable(200)));
        assert!(settlement.close().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deadline_reports_each_link_once() {
        let mock_server = MockServer::start().await;
        mount_status(&mock_server, "/fast", 200).await;

        Mock::given(method("GET"))
            .and(path("/edge"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&mock_server)
            .await;

        let links = vec![
            format!("{}/fast", mock_server.uri()),
            format!("{}/edge", mock_server.uri()),
            format!("{}/edge", mock_server.uri()),
        ];

        let reported = Arc::new(StdMutex::new(Vec::new()));
        let reported_clone = reported.clone();

        let prober = Prober::new(test_client())
            .with_deadline(Some(Duration::from_millis(300)))
            .with_probe_callback(Arc::new(move |url, _outcome| {
                reported_clone.lock().unwrap().push(url);
            }));

        let report = prober.probe(&links).await;

        // Give any task that outlived the abort a chance to finish
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(report.checked, 3);
        let reported = reported.lock().unwrap();
        assert_eq!(reported.len(), links.len());
        for link in &links {
            let expected = links.iter().filter(|l| *l == link).count();
            let seen = reported.iter().filter(|r| *r == link).count();
            assert_eq!(seen, expected, "{}", link);
        }
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_completes() {
        let mock_server = MockServer::start().await;
        mount_status(&mock_server, "/a", 200).await;
        mount_status(&mock_server, "/b", 503).await;

        let links = vec![
            format!("{}/a", mock_server.uri()),
            format!("{}/b", mock_server.uri()),
        ];
        let report = Prober::new(test_client())
            .with_concurrency(1)
            .probe(&links)
            .await;

        assert_eq!(report.failed, vec![links[1].clone()]);
    }
}
