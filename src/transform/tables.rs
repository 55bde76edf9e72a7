//! Schema definitions for the nine destination tables

use super::schema::{Column, ContextField, PayloadShape, TableSchema, ValueSource};

// =============================================================================
// League tables
// =============================================================================

pub static LEAGUE_INFORMATION: TableSchema = TableSchema {
    name: "league_information",
    shape: PayloadShape::Single,
    key: &["league_id"],
    column_groups: &[&[
        Column::text("league_id"),
        Column::text("name"),
        Column::text("status"),
        Column::text("sport"),
        Column::text("season_type"),
        Column::text("season"),
        Column::integer("total_rosters"),
        Column::text("draft_id"),
        Column::text("previous_league_id"),
        Column::text("avatar"),
        Column::object("settings"),
        Column::object("scoring_settings"),
        Column::list("roster_positions"),
    ]],
};

pub static LEAGUE_STATE: TableSchema = TableSchema {
    name: "league_state",
    shape: PayloadShape::Single,
    key: &[],
    column_groups: &[&[
        Column::text("season"),
        Column::integer("week"),
        Column::text("season_type"),
        Column::text("season_start_date"),
        Column::text("previous_season"),
        Column::integer("leg"),
        Column::text("league_season"),
        Column::text("league_create_season"),
        Column::integer("display_week"),
    ]],
};

pub static LEAGUE_ROSTERS: TableSchema = TableSchema {
    name: "league_rosters",
    shape: PayloadShape::List,
    key: &["league_id", "roster_id"],
    column_groups: &[
        &[
            Column::text("league_id")
                .from(ValueSource::FieldOrContext("league_id", ContextField::LeagueId)),
            Column::integer("roster_id"),
            Column::text("owner_id"),
            Column::list("starters"),
            Column::list("players"),
            Column::list("reserve"),
        ],
        &[
            settings_column("wins"),
            settings_column("losses"),
            settings_column("ties"),
            settings_column("waiver_position"),
            settings_column("waiver_budget_used"),
            settings_column("total_moves"),
            settings_column("fpts"),
            settings_column("fpts_decimal"),
            settings_column("fpts_against"),
            settings_column("fpts_against_decimal"),
        ],
        &[Column::object("settings"), Column::object("metadata")],
    ],
};

const fn settings_column(name: &'static str) -> Column {
    Column::integer(name).from(ValueSource::Nested("settings", name))
}

pub static LEAGUE_USERS: TableSchema = TableSchema {
    name: "league_users",
    shape: PayloadShape::List,
    key: &["league_id", "user_id"],
    column_groups: &[&[
        Column::text("league_id").from(ValueSource::Context(ContextField::LeagueId)),
        Column::text("user_id"),
        Column::text("username"),
        Column::text("display_name"),
        Column::text("avatar"),
        Column::object("metadata"),
        Column::boolean("is_owner").from(ValueSource::Truthy("is_owner")),
    ]],
};

pub static MATCHUPS: TableSchema = TableSchema {
    name: "matchups",
    shape: PayloadShape::List,
    key: &["league_id", "roster_id", "matchup_id"],
    column_groups: &[&[
        Column::text("league_id").from(ValueSource::Context(ContextField::LeagueId)),
        Column::integer("roster_id"),
        Column::integer("matchup_id"),
        Column::list("starters"),
        Column::list("players"),
        Column::real("points"),
        Column::real("custom_points"),
    ]],
};

// =============================================================================
// Global player tables
// =============================================================================

pub static PLAYERS: TableSchema = TableSchema {
    name: "players",
    shape: PayloadShape::Keyed,
    key: &["player_id"],
    column_groups: &[&[
        Column::text("player_id").from(ValueSource::FieldOrKey("player_id")),
        Column::text("first_name"),
        Column::text("last_name"),
        Column::text("full_name"),
        Column::text("status"),
        Column::text("team"),
        Column::text("team_abbr"),
        Column::text("position"),
        Column::list("fantasy_positions"),
        Column::text("primary_fantasy_position").from(ValueSource::FirstOf("fantasy_positions")),
        Column::integer("age"),
        Column::text("birth_date"),
        Column::text("height_inches").from(ValueSource::Field("height")),
        Column::text("weight_lbs").from(ValueSource::Field("weight")),
        Column::integer("years_exp"),
        Column::text("college").from(ValueSource::TrimmedText("college")),
        Column::text("sport"),
        Column::text("injury_status"),
        Column::text("injury_body_part"),
        Column::text("injury_notes"),
        Column::text("injury_start_date"),
        Column::boolean("active"),
        Column::text("depth_chart_position"),
        Column::integer("depth_chart_order"),
        Column::text("hashtag"),
        Column::integer("team_changed_at"),
        Column::integer("news_updated"),
        Column::text("channel_id").from(ValueSource::Nested("metadata", "channel_id")),
        Column::object("metadata"),
    ]],
};

pub static TRENDING_PLAYERS: TableSchema = TableSchema {
    name: "trending_players",
    shape: PayloadShape::List,
    key: &["player_id"],
    column_groups: &[&[
        Column::text("player_id"),
        Column::integer("add_count").from(ValueSource::Field("count")),
    ]],
};

/// Stat vocabulary shared by the season and weekly statistics tables.
pub const STAT_COLUMNS: &[Column] = &[
    Column::real("reb"),
    Column::real("plus_minus"),
    Column::real("bonus_pt_50p"),
    Column::real("pos_rank_std"),
    Column::real("gp"),
    Column::real("blk_stl"),
    Column::real("fga"),
    Column::real("oreb"),
    Column::real("fgmi"),
    Column::real("pts"),
    Column::real("rank_std"),
    Column::real("tpa"),
    Column::real("dreb"),
    Column::real("fgm"),
    Column::real("pts_std"),
    Column::real("bonus_ast_15p"),
    Column::real("pts_reb"),
    Column::real("ff"),
    Column::real("tf"),
    Column::real("dd"),
    Column::real("ftmi"),
    Column::real("stl"),
    Column::real("reb_ast"),
    Column::real("fta"),
    // `to` is a reserved word in SQL
    Column::real("turnovers").from(ValueSource::Field("to")),
    Column::real("gs"),
    Column::real("ast"),
    Column::real("blk"),
    Column::real("pf"),
    Column::real("sp"),
    Column::real("tpm"),
    Column::real("bonus_pt_40p"),
    Column::real("bonus_reb_20p"),
    Column::real("pts_reb_ast"),
    Column::real("td"),
    Column::real("pts_std_dfs"),
    Column::real("tpmi"),
    Column::real("pts_ast"),
    Column::real("ftm"),
];

pub const SPLIT_COLUMNS: &[Column] = &[
    Column::real("q1_pts"),
    Column::real("q2_pts"),
    Column::real("q3_pts"),
    Column::real("q4_pts"),
    Column::real("q1_reb"),
    Column::real("q2_reb"),
    Column::real("q3_reb"),
    Column::real("q4_reb"),
    Column::real("q1_ast"),
    Column::real("q2_ast"),
    Column::real("q3_ast"),
    Column::real("q4_ast"),
    Column::real("h1_pts"),
    Column::real("h2_pts"),
    Column::real("h1_reb"),
    Column::real("h2_reb"),
    Column::real("h1_ast"),
    Column::real("h2_ast"),
];

pub static PLAYER_STATISTICS: TableSchema = TableSchema {
    name: "aggregated_player_statistics",
    shape: PayloadShape::Keyed,
    key: &["player_id"],
    column_groups: &[
        &[Column::text("player_id").from(ValueSource::EntryKey)],
        STAT_COLUMNS,
    ],
};

pub static WEEKLY_PLAYER_STATISTICS: TableSchema = TableSchema {
    name: "weekly_player_statistics",
    shape: PayloadShape::Keyed,
    key: &["league_id", "season", "week", "player_id"],
    column_groups: &[
        &[
            Column::text("league_id").from(ValueSource::Context(ContextField::LeagueId)),
            Column::text("season").from(ValueSource::Context(ContextField::Season)),
            Column::integer("week").from(ValueSource::Context(ContextField::Week)),
            Column::text("player_id").from(ValueSource::EntryKey),
        ],
        STAT_COLUMNS,
        SPLIT_COLUMNS,
    ],
};
