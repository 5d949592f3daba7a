// src/session.rs
// =============================================================================
// The "what am I looking at right now" state: repository, branches, selected
// branch, tree, selected file.
//
// Every load starts by taking a Generation ticket. When the result arrives it
// is applied only if no newer selection has happened since. A late response
// for a repository or branch the user already moved away from is dropped
// instead of overwriting the current view.
//
// Rust concepts:
// - &mut Session: one owner of the state, passed explicitly, never global
// - Newtype (Generation): a u64 that cannot be mixed up with other numbers
// =============================================================================

use tracing::{debug, info};

use crate::github::{
    build_tree, parse_repository, Branch, ForgeClient, ForgeError, RepositoryIdentifier,
    RepositorySummary, TreeListing, TreeNode,
};

/// Ticket identifying which selection a pending load belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Current selection state
#[derive(Debug, Default)]
pub struct Session {
    generation: u64,
    file_generation: u64,
    repository: Option<RepositoryIdentifier>,
    summary: Option<RepositorySummary>,
    branches: Vec<Branch>,
    branch: Option<Branch>,
    tree: Vec<TreeNode>,
    truncated: bool,
    selected_file: Option<String>,
}

// Picks the branch to show first
//
// The repository's default branch if it is in the list, otherwise whatever
// the API listed first.
pub fn select_initial_branch<'a>(default_branch: &str, branches: &'a [Branch]) -> Option<&'a Branch> {
    branches
        .iter()
        .find(|b| b.name == default_branch)
        .or_else(|| branches.first())
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(&mut self) -> Generation {
        self.generation += 1;
        Generation(self.generation)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.generation
    }

    // Returns false (and logs) when the result belongs to an older selection
    fn accept(&self, generation: Generation, what: &str) -> bool {
        let current = self.is_current(generation);
        if !current {
            debug!(what, stale = generation.0, current = self.generation, "discarding stale result");
        }
        current
    }

    pub fn repository(&self) -> Option<&RepositoryIdentifier> {
        self.repository.as_ref()
    }

    pub fn summary(&self) -> Option<&RepositorySummary> {
        self.summary.as_ref()
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self) -> Option<&Branch> {
        self.branch.as_ref()
    }

    pub fn tree(&self) -> &[TreeNode] {
        &self.tree
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    /// Starts a new repository selection, clearing everything else
    pub fn begin_repository(&mut self, repository: RepositoryIdentifier) -> Generation {
        let generation = self.advance();
        *self = Session {
            generation: self.generation,
            // A new repository also invalidates any pending file load
            file_generation: self.file_generation + 1,
            repository: Some(repository),
            ..Session::default()
        };
        generation
    }

    /// Stores summary and branches, and picks the initial branch
    pub fn apply_repository(
        &mut self,
        generation: Generation,
        summary: RepositorySummary,
        branches: Vec<Branch>,
    ) -> bool {
        if !self.accept(generation, "repository") {
            return false;
        }
        self.branch = select_initial_branch(&summary.default_branch, &branches).cloned();
        self.summary = Some(summary);
        self.branches = branches;
        true
    }

    // Switches to another branch from the list captured with the repository
    //
    // Returns None when the branch is not in that list.
    pub fn begin_branch(&mut self, name: &str) -> Option<Generation> {
        let branch = self.branches.iter().find(|b| b.name == name)?.clone();
        let generation = self.advance();
        self.branch = Some(branch);
        self.tree.clear();
        self.truncated = false;
        self.selected_file = None;
        self.file_generation += 1;
        Some(generation)
    }

    /// Replaces the tree wholesale with one built from `listing`
    pub fn apply_tree(&mut self, generation: Generation, listing: &TreeListing) -> bool {
        if !self.accept(generation, "tree") {
            return false;
        }
        self.tree = build_tree(&listing.entries);
        self.truncated = listing.truncated;
        true
    }

    // Marks a file as selected; its content load must present this ticket
    //
    // File selections have their own counter: picking a file must not
    // invalidate a tree load for the same branch.
    pub fn begin_file(&mut self, path: &str) -> Generation {
        self.selected_file = Some(path.to_string());
        self.file_generation += 1;
        Generation(self.file_generation)
    }

    /// True if no other file has been selected since `generation` was issued
    pub fn is_current_file(&self, generation: Generation) -> bool {
        generation.0 == self.file_generation
    }
}

// Loads a repository into the session: summary, branches, initial branch, tree
//
// Parameters:
//   input: whatever the user typed ("owner/repo", a URL, ...)
pub async fn open_repository(
    forge: &ForgeClient,
    session: &mut Session,
    input: &str,
) -> Result<(), ForgeError> {
    let id = parse_repository(input)
        .ok_or_else(|| ForgeError::UnrecognizedRepository(input.to_string()))?;

    info!(repository = %id, "opening repository");
    let generation = session.begin_repository(id.clone());

    let summary = forge.fetch_repository_summary(&id).await?;
    let branches = forge.fetch_branches(&id).await?;
    if !session.apply_repository(generation, summary, branches) {
        return Ok(());
    }

    let Some(branch) = session.branch().cloned() else {
        // An empty repository has no branches and so no tree
        return Ok(());
    };

    let listing = forge.fetch_tree(&id, &branch.commit_sha).await?;
    session.apply_tree(generation, &listing);
    Ok(())
}

/// Switches branch and loads its tree
pub async fn switch_branch(
    forge: &ForgeClient,
    session: &mut Session,
    name: &str,
) -> Result<(), ForgeError> {
    let generation = session
        .begin_branch(name)
        .ok_or_else(|| ForgeError::UnknownBranch(name.to_string()))?;
    let Some(id) = session.repository().cloned() else {
        return Err(ForgeError::UnknownBranch(name.to_string()));
    };

    let sha = session
        .branch()
        .map(|b| b.commit_sha.clone())
        .unwrap_or_default();
    let listing = forge.fetch_tree(&id, &sha).await?;
    session.apply_tree(generation, &listing);
    Ok(())
}
