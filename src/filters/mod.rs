//! Filter stage over status, member and space.
//!
//! A `FilterSet` is an immutable value. Every transition returns a new set so
//! two sets can be compared (or hashed) to tell whether a recompute is needed.
//! Keys absent from a dimension are treated as disabled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tasks::{Task, TaskFeed};

/// One of the three independent filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDimension {
    Status,
    Member,
    Space,
}

/// Included/excluded flags for statuses, members and spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub statuses: BTreeMap<String, bool>,
    #[serde(default)]
    pub members: BTreeMap<String, bool>,
    #[serde(default)]
    pub spaces: BTreeMap<String, bool>,
}

impl FilterSet {
    /// Seed a filter set from everything a feed mentions.
    ///
    /// Statuses and members start enabled. Spaces start enabled only when they
    /// are the primary space; with no primary space every space is enabled.
    pub fn discover(feed: &TaskFeed, primary_space: Option<&str>) -> Self {
        FilterSet::default().merged_with_discovered(feed, primary_space)
    }

    /// Add keys seen in `feed` that this set does not know yet, using the
    /// discovery defaults. Existing flags are kept as they are.
    pub fn merged_with_discovered(&self, feed: &TaskFeed, primary_space: Option<&str>) -> Self {
        let mut next = self.clone();
        for status in feed.statuses() {
            next.statuses.entry(status).or_insert(true);
        }
        for member in feed.member_names() {
            next.members.entry(member).or_insert(true);
        }
        for space in feed.space_ids() {
            let included = primary_space.is_none_or(|primary| primary == space);
            next.spaces.entry(space).or_insert(included);
        }
        next
    }

    fn dimension(&self, dimension: FilterDimension) -> &BTreeMap<String, bool> {
        match dimension {
            FilterDimension::Status => &self.statuses,
            FilterDimension::Member => &self.members,
            FilterDimension::Space => &self.spaces,
        }
    }

    fn dimension_mut(&mut self, dimension: FilterDimension) -> &mut BTreeMap<String, bool> {
        match dimension {
            FilterDimension::Status => &mut self.statuses,
            FilterDimension::Member => &mut self.members,
            FilterDimension::Space => &mut self.spaces,
        }
    }

    /// Whether `key` is included. Unknown keys are not.
    pub fn is_enabled(&self, dimension: FilterDimension, key: &str) -> bool {
        self.dimension(dimension).get(key).copied().unwrap_or(false)
    }

    /// Whether at least one key in the dimension is included.
    pub fn any_enabled(&self, dimension: FilterDimension) -> bool {
        self.dimension(dimension).values().any(|&on| on)
    }

    /// Enabled keys of a dimension, in key order.
    pub fn enabled_keys(&self, dimension: FilterDimension) -> Vec<&str> {
        self.dimension(dimension)
            .iter()
            .filter(|&(_, &on)| on)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Set a single flag.
    pub fn with(&self, dimension: FilterDimension, key: impl Into<String>, included: bool) -> Self {
        let mut next = self.clone();
        next.dimension_mut(dimension).insert(key.into(), included);
        next
    }

    /// Flip a single flag. An unknown key becomes enabled.
    pub fn toggled(&self, dimension: FilterDimension, key: &str) -> Self {
        let included = !self.is_enabled(dimension, key);
        self.with(dimension, key, included)
    }

    /// Enable exactly `keys` in a dimension; every other known key is disabled.
    pub fn only<I, S>(&self, dimension: FilterDimension, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.all_disabled(dimension);
        let flags = next.dimension_mut(dimension);
        for key in keys {
            flags.insert(key.into(), true);
        }
        next
    }

    /// Enable every known key of a dimension.
    pub fn all_enabled(&self, dimension: FilterDimension) -> Self {
        self.set_all(dimension, true)
    }

    /// Disable every known key of a dimension.
    pub fn all_disabled(&self, dimension: FilterDimension) -> Self {
        self.set_all(dimension, false)
    }

    fn set_all(&self, dimension: FilterDimension, included: bool) -> Self {
        let mut next = self.clone();
        for flag in next.dimension_mut(dimension).values_mut() {
            *flag = included;
        }
        next
    }

    /// The in-scope predicate.
    ///
    /// Status and space must be enabled. The member dimension passes when any
    /// assignee is enabled, or when the task is unassigned and at least one
    /// member is enabled, so disabling every member empties the view.
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = task
            .status
            .as_deref()
            .is_some_and(|s| self.is_enabled(FilterDimension::Status, s));
        if !status_ok {
            return false;
        }

        let space_ok = task
            .space_id
            .as_deref()
            .is_some_and(|s| self.is_enabled(FilterDimension::Space, s));
        if !space_ok {
            return false;
        }

        if task.is_unassigned() {
            self.any_enabled(FilterDimension::Member)
        } else {
            task.assignees
                .iter()
                .any(|a| self.is_enabled(FilterDimension::Member, a))
        }
    }
}

/// Keep the tasks that pass every dimension, preserving input order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filters: &FilterSet) -> Vec<&'a Task> {
    let in_scope: Vec<&Task> = tasks.iter().filter(|t| filters.matches(t)).collect();
    debug!(total = tasks.len(), in_scope = in_scope.len(), "Filtered tasks");
    in_scope
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: &str, assignees: &[&str], space: &str) -> Task {
        let mut t = Task::new(id, id).with_status(status).with_space(space);
        for a in assignees {
            t = t.with_assignee(*a);
        }
        t
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            task("t1", "to do", &["alice"], "s1"),
            task("t2", "in progress", &["bob", "alice"], "s1"),
            task("t3", "complete", &["carol"], "s2"),
            task("t4", "bugs", &[], "s2"),
            task("t5", "to do", &["bob"], "s2"),
        ]
    }

    fn all_enabled(tasks: &[Task]) -> FilterSet {
        FilterSet::discover(&TaskFeed::from_tasks(tasks.to_vec()), None)
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn fully_enabled_returns_input_in_order() {
        let tasks = sample_tasks();
        let filters = all_enabled(&tasks);
        let out = filter_tasks(&tasks, &filters);
        assert_eq!(ids(&out), vec!["t1", "t2", "t3", "t4", "t5"]);
    }

    #[test]
    fn any_dimension_fully_disabled_returns_empty() {
        let tasks = sample_tasks();
        let filters = all_enabled(&tasks);
        for dimension in [
            FilterDimension::Status,
            FilterDimension::Member,
            FilterDimension::Space,
        ] {
            let disabled = filters.all_disabled(dimension);
            assert!(
                filter_tasks(&tasks, &disabled).is_empty(),
                "{dimension:?} disabled should empty the view"
            );
        }
    }

    #[test]
    fn empty_filter_set_matches_nothing() {
        let tasks = sample_tasks();
        assert!(filter_tasks(&tasks, &FilterSet::default()).is_empty());
    }

    #[test]
    fn member_dimension_is_or_across_assignees() {
        let tasks = sample_tasks();
        let filters = all_enabled(&tasks).only(FilterDimension::Member, ["alice"]);
        let out = filter_tasks(&tasks, &filters);
        // t2 is shared with bob; t4 is unassigned and still visible.
        assert_eq!(ids(&out), vec!["t1", "t2", "t4"]);
    }

    #[test]
    fn dimensions_combine_with_and() {
        let tasks = sample_tasks();
        let filters = all_enabled(&tasks)
            .only(FilterDimension::Space, ["s2"])
            .only(FilterDimension::Status, ["to do", "bugs"]);
        let out = filter_tasks(&tasks, &filters);
        assert_eq!(ids(&out), vec!["t4", "t5"]);
    }

    #[test]
    fn missing_status_or_space_never_matches() {
        let tasks = vec![
            Task::new("t1", "no status").with_space("s1").with_assignee("a"),
            Task::new("t2", "no space").with_status("to do").with_assignee("a"),
        ];
        let filters = FilterSet::default()
            .with(FilterDimension::Status, "to do", true)
            .with(FilterDimension::Member, "a", true)
            .with(FilterDimension::Space, "s1", true);
        assert!(filter_tasks(&tasks, &filters).is_empty());
    }

    #[test]
    fn transitions_return_new_values() {
        let base = FilterSet::default().with(FilterDimension::Status, "to do", true);
        let toggled = base.toggled(FilterDimension::Status, "to do");

        assert!(base.is_enabled(FilterDimension::Status, "to do"));
        assert!(!toggled.is_enabled(FilterDimension::Status, "to do"));
        assert_ne!(base, toggled);
        assert_eq!(base, toggled.toggled(FilterDimension::Status, "to do"));
    }

    #[test]
    fn toggling_unknown_key_enables_it() {
        let filters = FilterSet::default().toggled(FilterDimension::Member, "dave");
        assert!(filters.is_enabled(FilterDimension::Member, "dave"));
    }

    #[test]
    fn only_disables_other_known_keys() {
        let filters = FilterSet::default()
            .with(FilterDimension::Space, "s1", true)
            .with(FilterDimension::Space, "s2", true)
            .only(FilterDimension::Space, ["s2", "s3"]);
        assert_eq!(filters.enabled_keys(FilterDimension::Space), vec!["s2", "s3"]);
        assert!(!filters.is_enabled(FilterDimension::Space, "s1"));
    }

    #[test]
    fn discovery_enables_only_primary_space() {
        let feed = TaskFeed::from_tasks(sample_tasks());
        let filters = FilterSet::discover(&feed, Some("s1"));
        assert!(filters.is_enabled(FilterDimension::Space, "s1"));
        assert!(!filters.is_enabled(FilterDimension::Space, "s2"));
        assert!(filters.is_enabled(FilterDimension::Status, "bugs"));
        assert!(filters.is_enabled(FilterDimension::Member, "carol"));
    }

    #[test]
    fn merge_keeps_existing_flags() {
        let feed = TaskFeed::from_tasks(sample_tasks());
        let filters = FilterSet::discover(&feed, None).with(FilterDimension::Member, "bob", false);

        let mut grown = sample_tasks();
        grown.push(task("t6", "review", &["erin"], "s3"));
        let merged = filters.merged_with_discovered(&TaskFeed::from_tasks(grown), Some("s1"));

        assert!(!merged.is_enabled(FilterDimension::Member, "bob"));
        assert!(merged.is_enabled(FilterDimension::Member, "erin"));
        assert!(merged.is_enabled(FilterDimension::Status, "review"));
        // s2 was already enabled; s3 is new and not primary.
        assert!(merged.is_enabled(FilterDimension::Space, "s2"));
        assert!(!merged.is_enabled(FilterDimension::Space, "s3"));
    }

    #[test]
    fn filter_set_serde_shape() {
        let filters = FilterSet::default().with(FilterDimension::Status, "to do", true);
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["statuses"]["to do"], true);
        assert!(json["members"].as_object().unwrap().is_empty());
    }
}
