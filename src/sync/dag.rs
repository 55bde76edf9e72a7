//! Job dependency graph and its topological resolution.

use std::collections::{BTreeMap, BTreeSet};

use super::jobs::Job;

/// Errors that can occur while resolving the job graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DagError {
    #[error("{job} depends on {prerequisite}, which is not scheduled")]
    MissingPrerequisite { job: String, prerequisite: String },

    #[error("Cycle detected among jobs: {0:?}")]
    CycleDetected(Vec<String>),
}

/// A resolved job graph with a stable execution order.
#[derive(Debug, Clone)]
pub struct JobGraph {
    order: Vec<Job>,
    prerequisites: BTreeMap<Job, Vec<Job>>,
    dependents: BTreeMap<Job, Vec<Job>>,
}

impl JobGraph {
    /// The nine synchronization jobs and their declared prerequisites.
    pub fn standard() -> Result<Self, DagError> {
        Self::resolve(&Job::ALL)
    }

    /// Resolve `jobs` using each job's declared prerequisites.
    pub fn resolve(jobs: &[Job]) -> Result<Self, DagError> {
        let edges: Vec<(Job, Job)> = jobs
            .iter()
            .flat_map(|job| job.prerequisites().iter().map(move |prereq| (*job, *prereq)))
            .collect();
        Self::from_edges(jobs, &edges)
    }

    /// Resolve `jobs` with explicit `(job, prerequisite)` edges.
    ///
    /// Kahn's algorithm, always taking the earliest ready job in input order,
    /// so jobs without a mutual dependency keep the order they were given in.
    pub fn from_edges(jobs: &[Job], edges: &[(Job, Job)]) -> Result<Self, DagError> {
        let position: BTreeMap<Job, usize> =
            jobs.iter().enumerate().map(|(i, job)| (*job, i)).collect();

        let mut prerequisites: BTreeMap<Job, Vec<Job>> =
            jobs.iter().map(|job| (*job, Vec::new())).collect();
        let mut dependents = prerequisites.clone();

        for (job, prerequisite) in edges {
            if !position.contains_key(prerequisite) {
                return Err(DagError::MissingPrerequisite {
                    job: job.to_string(),
                    prerequisite: prerequisite.to_string(),
                });
            }
            if let Some(list) = prerequisites.get_mut(job) {
                if !list.contains(prerequisite) {
                    list.push(*prerequisite);
                    dependents.entry(*prerequisite).or_default().push(*job);
                }
            }
        }

        let mut in_degree: BTreeMap<Job, usize> = prerequisites
            .iter()
            .map(|(job, prereqs)| (*job, prereqs.len()))
            .collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(job, _)| position[job])
            .collect();

        let mut order = Vec::with_capacity(jobs.len());
        while let Some(index) = ready.pop_first() {
            let job = jobs[index];
            order.push(job);
            for dependent in &dependents[&job] {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(position[dependent]);
                    }
                }
            }
        }

        if order.len() != position.len() {
            let remaining = in_degree
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .map(|(job, _)| job.to_string())
                .collect();
            return Err(DagError::CycleDetected(remaining));
        }

        Ok(Self {
            order,
            prerequisites,
            dependents,
        })
    }

    /// Jobs in topological order.
    pub fn order(&self) -> &[Job] {
        &self.order
    }

    pub fn prerequisites(&self, job: Job) -> &[Job] {
        self.prerequisites.get(&job).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents(&self, job: Job) -> &[Job] {
        self.dependents.get(&job).map(Vec::as_slice).unwrap_or(&[])
    }
}
