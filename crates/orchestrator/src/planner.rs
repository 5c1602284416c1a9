//! Decides, from an event and the current mapping, which Steps must run.
//!
//! Planning is pure: no network or process calls happen here, and the mapping
//! is only read. Data flowing between Steps is wired through [`Deferred`]
//! handles whose producers are always placed before their consumers.

use github::PrState;
use sync_core::{
    diff, Commit, PrMapping, PullRequest, PullRequestAction, PullRequestEvent, SyncConfig,
    NO_SYNC_SIGNAL,
};
use tracing::debug;

use crate::deferred::Deferred;
use crate::step::Step;
use crate::steps::{
    ChangeUpstreamStep, CommentStep, FetchUpstreamableStep, MergeUpstreamStep, OpenUpstreamStep,
    UpstreamStep, UrlSource,
};

/// Ordered Steps produced for one event.
#[derive(Default)]
pub struct Plan {
    steps: Vec<Box<dyn Step>>,
}

impl Plan {
    /// A plan running `steps` in the given order.
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.label()).collect()
    }
}

/// Whether planning `event` depends on the pull request's diff.
pub fn needs_diff(event: &PullRequestEvent) -> bool {
    !is_opted_out(&event.pull_request)
        && matches!(
            event.action,
            PullRequestAction::Opened | PullRequestAction::Synchronize
        )
}

fn is_opted_out(pull_request: &PullRequest) -> bool {
    pull_request.body_text().contains(NO_SYNC_SIGNAL)
}

pub fn plan(
    config: &SyncConfig,
    event: &PullRequestEvent,
    mapping: &PrMapping,
    pr_diff: &str,
) -> Plan {
    let pull_request = &event.pull_request;
    if is_opted_out(pull_request) {
        debug!(pr = pull_request.number, "Pull request opted out of sync");
        return Plan::default();
    }

    let mut builder = PlanBuilder::default();
    match event.action {
        PullRequestAction::Opened | PullRequestAction::Synchronize => {
            builder.new_contents(config, mapping, pull_request, pr_diff)
        }
        PullRequestAction::Closed => builder.closed(mapping, pull_request),
        PullRequestAction::Other => {
            debug!(pr = pull_request.number, "Ignoring pull request action");
        }
    }

    builder.finish()
}

#[derive(Default)]
struct PlanBuilder {
    steps: Vec<Box<dyn Step>>,
}

impl PlanBuilder {
    fn finish(self) -> Plan {
        Plan::new(self.steps)
    }

    fn new_contents(
        &mut self,
        config: &SyncConfig,
        mapping: &PrMapping,
        pull_request: &PullRequest,
        pr_diff: &str,
    ) {
        let pr_number = pull_request.key();
        let upstreamable = diff::contains_upstreamable_changes(pr_diff, &config.upstreamable_path);

        if let Some(upstream) = mapping.get(&pr_number) {
            if upstreamable {
                let commits = self.fetch_upstreamable(pull_request);
                self.upstream(&pr_number, commits);
                // It may have been closed earlier for lacking upstreamable changes.
                self.change_upstream(upstream, PrState::Open);
            } else {
                self.change_upstream(upstream, PrState::Closed);
            }
            self.comment(
                pull_request.number,
                UrlSource::Known(config.upstream_pr_html_url(upstream)),
            );
        } else if upstreamable {
            let commits = self.fetch_upstreamable(pull_request);
            let branch = self.upstream(&pr_number, commits);
            let body = format!("Reviewed in {}.", config.source_pr_html_url(&pr_number));
            let pr_url = self.open_upstream(&pr_number, &pull_request.title, body, branch);
            self.comment(pull_request.number, UrlSource::Deferred(pr_url));
        }
    }

    fn closed(&mut self, mapping: &PrMapping, pull_request: &PullRequest) {
        let pr_number = pull_request.key();
        // Never mapped means it never carried upstreamable changes.
        let Some(upstream) = mapping.get(&pr_number) else {
            return;
        };

        if pull_request.merged {
            self.merge_upstream(&pr_number, upstream);
        } else {
            // Keep the entry so a reopen targets the same upstream PR.
            self.change_upstream(upstream, PrState::Closed);
        }
    }

    fn push(&mut self, step: impl Step + 'static) {
        self.steps.push(Box::new(step));
    }

    fn fetch_upstreamable(&mut self, pull_request: &PullRequest) -> Deferred<Vec<Commit>> {
        let step = FetchUpstreamableStep::new(&pull_request.commits_url);
        let commits = step.commits();
        self.push(step);
        commits
    }

    fn upstream(&mut self, pr_number: &str, commits: Deferred<Vec<Commit>>) -> Deferred<String> {
        let step = UpstreamStep::new(pr_number, commits);
        let branch = step.branch();
        self.push(step);
        branch
    }

    fn change_upstream(&mut self, upstream: u64, state: PrState) {
        self.push(ChangeUpstreamStep::new(upstream, state));
    }

    fn merge_upstream(&mut self, pr_number: &str, upstream: u64) {
        self.push(MergeUpstreamStep::new(pr_number, upstream));
    }

    fn open_upstream(
        &mut self,
        pr_number: &str,
        title: &str,
        body: String,
        branch: Deferred<String>,
    ) -> Deferred<String> {
        let step = OpenUpstreamStep::new(pr_number, title, body, branch);
        let pr_url = step.pr_url();
        self.push(step);
        pr_url
    }

    fn comment(&mut self, source_pr: u64, upstream_url: UrlSource) {
        self.push(CommentStep::new(source_pr, upstream_url));
    }
}
