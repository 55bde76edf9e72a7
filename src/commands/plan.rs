//! The `plan` command: show what a sync run would do, without running it.

use crate::{
    cli::JobArgs,
    config::resolve_league_id,
    sync::{Job, JobGraph, JobParams},
    Result,
};

/// Handle the plan command
pub fn handle_plan(jobs: JobArgs) -> Result<()> {
    let params = JobParams {
        league_id: resolve_league_id(jobs.league_id)?,
        sport: jobs.sport,
        season_type: jobs.season_type,
        stats_season: jobs.stats_season,
        matchup_week: jobs.matchup_week,
    };
    let graph = JobGraph::standard()?;

    for line in plan_lines(&graph, &params) {
        println!("{line}");
    }
    Ok(())
}

/// One line per job in execution order.
pub fn plan_lines(graph: &JobGraph, params: &JobParams) -> Vec<String> {
    graph
        .order()
        .iter()
        .enumerate()
        .map(|(index, job)| {
            let prerequisites = graph.prerequisites(*job);
            let after = if prerequisites.is_empty() {
                String::new()
            } else {
                let names: Vec<_> = prerequisites.iter().map(Job::name).collect();
                format!(" (after {})", names.join(", "))
            };
            format!(
                "{}. {} -> {} via {}{after}",
                index + 1,
                job.name(),
                job.table(),
                describe_fetch(*job, params)
            )
        })
        .collect()
}

fn describe_fetch(job: Job, params: &JobParams) -> String {
    match job.endpoint(params) {
        Some(endpoint) => endpoint.path(),
        None => format!(
            "state/{sport} then stats/{sport}/{}/{}/<current week>",
            params.season_type,
            params.stats_season,
            sport = params.sport
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LeagueId;

    #[test]
    fn test_plan_lines() {
        let graph = JobGraph::standard().unwrap();
        let params = JobParams::new(LeagueId::new("L1").unwrap());

        let lines = plan_lines(&graph, &params);

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "1. league_information -> league_information via league/L1");
        assert_eq!(
            lines[6],
            "7. player_statistics -> aggregated_player_statistics via stats/nba/regular/2025"
        );
        assert_eq!(
            lines[8],
            "9. weekly_player_statistics -> weekly_player_statistics via state/nba then \
             stats/nba/regular/2025/<current week> (after league_state)"
        );
    }
}
