use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic request tag. Only the latest generation may commit.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    latest: u64,
}

impl GenerationCounter {
    pub fn advance(&mut self) -> Generation {
        self.latest += 1;
        Generation(self.latest)
    }

    pub fn latest(&self) -> Generation {
        Generation(self.latest)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.latest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    Stale { generation: Generation, latest: Generation },
}

#[derive(Debug, Clone)]
pub struct Committed<S, T> {
    pub generation: Generation,
    pub selection: S,
    pub data: T,
}

#[derive(Debug)]
pub struct Session<S, T> {
    generations: GenerationCounter,
    selection: Option<S>,
    committed: Option<Committed<S, T>>,
    last_error: Option<(Generation, String)>,
}

impl<S, T> Default for Session<S, T> {
    fn default() -> Self {
        Self {
            generations: GenerationCounter::default(),
            selection: None,
            committed: None,
            last_error: None,
        }
    }
}

impl<S: Clone, T> Session<S, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, selection: S) -> Generation {
        self.selection = Some(selection);
        self.last_error = None;
        let generation = self.generations.advance();
        debug!(generation = generation.value(), "selection replaced");
        generation
    }

    pub fn commit(&mut self, generation: Generation, data: T) -> CommitOutcome {
        if !self.generations.is_current(generation) {
            let latest = self.generations.latest();
            debug!(
                generation = generation.value(),
                latest = latest.value(),
                "discarding stale batch"
            );
            return CommitOutcome::Stale { generation, latest };
        }

        let Some(selection) = self.selection.clone() else {
            return CommitOutcome::Stale {
                generation,
                latest: generation,
            };
        };

        self.committed = Some(Committed {
            generation,
            selection,
            data,
        });
        CommitOutcome::Applied
    }

    pub fn fail(&mut self, generation: Generation, error: &anyhow::Error) -> CommitOutcome {
        if !self.generations.is_current(generation) {
            return CommitOutcome::Stale {
                generation,
                latest: self.generations.latest(),
            };
        }

        warn!(generation = generation.value(), error = %error, "resource batch failed");
        self.last_error = Some((generation, format!("{error:#}")));
        CommitOutcome::Applied
    }

    pub fn committed(&self) -> Option<&Committed<S, T>> {
        self.committed.as_ref()
    }

    pub fn into_committed(self) -> Option<Committed<S, T>> {
        self.committed
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_ref().map(|(_, message)| message.as_str())
    }
}
