//! Cut folders
//!
//! A cut is a folder whose name encodes its identity under the series naming
//! convention. It carries an append-only status history and, once inserted
//! into an episode, a list of child materials in that episode's arena.

use crate::conflict;
use crate::identity::{opt_text_eq, CutIdentity, Stage};
use crate::ids::{EpisodeId, MaterialId};
use crate::lifecycle::{History, Status, StatusEntry};
use crate::materials::MaterialHeader;
use setman_common::{Code, Error, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Cut {
    header: MaterialHeader,
    episode: EpisodeId,
    identity: CutIdentity,
    number: u32,
    history: History,
    pub(crate) children: Vec<MaterialId>,
}

impl Cut {
    /// Build a cut for `episode` from an already parsed identity
    ///
    /// Fails with `parse_failed` when the identity carries no cut number.
    pub fn new(episode: EpisodeId, path: impl Into<PathBuf>, identity: CutIdentity) -> Result<Self> {
        Self::restore(MaterialHeader::new(path), episode, identity, History::new())
    }

    pub(crate) fn restore(
        header: MaterialHeader,
        episode: EpisodeId,
        identity: CutIdentity,
        history: History,
    ) -> Result<Self> {
        let number = identity.number.ok_or_else(|| {
            Error::with_message(
                Code::ParseFailed,
                format!("{} does not encode a cut number", header.name()),
            )
        })?;

        Ok(Self {
            header,
            episode,
            identity,
            number,
            history,
            children: Vec::new(),
        })
    }

    pub fn header(&self) -> &MaterialHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut MaterialHeader {
        &mut self.header
    }

    pub fn name(&self) -> String {
        self.header.name()
    }

    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    /// Identity as parsed from the folder name
    pub fn identifier(&self) -> &CutIdentity {
        &self.identity
    }

    pub fn scene(&self) -> Option<u32> {
        self.identity.scene
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn stage(&self) -> Option<&str> {
        self.identity.stage.as_deref()
    }

    /// Pipeline stage the label belongs to, if the name encodes one
    pub fn stage_kind(&self) -> Option<(Stage, bool)> {
        self.stage().map(Stage::classify)
    }

    pub fn take(&self) -> Option<u32> {
        self.identity.take
    }

    pub(crate) fn same_stage(&self, other: &Cut) -> bool {
        opt_text_eq(&self.identity.stage, &other.identity.stage)
    }

    /// Append a status to the history
    pub fn mark(&mut self, status: Status) {
        tracing::debug!(cut = %self.name(), status = %status, "Marked cut");
        self.history.record(status);
    }

    pub fn status(&self) -> Status {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn last_update(&self) -> &StatusEntry {
        self.history.last()
    }

    pub fn children(&self) -> &[MaterialId] {
        &self.children
    }

    /// Same episode, scene and number
    pub fn matches(&self, other: &Cut) -> bool {
        conflict::matches(self, other)
    }

    /// Matches and shares the stage label
    pub fn conflicts(&self, other: &Cut) -> bool {
        conflict::conflicts(self, other)
    }
}
