//! Get-or-create for leagues and teams keyed by normalized natural keys.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use unicode_normalization::UnicodeNormalization;

/// Natural-key form of a display name: NFC, lowercased, whitespace collapsed.
/// Punctuation is kept so "F.C. Porto" and "FC Porto" stay distinct.
pub fn normalize_key(raw: &str) -> String {
    raw.nfc()
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// League id for (name, country). `None` when the name is absent or blank.
///
/// An existing league gets its logo/flag refreshed only when the incoming
/// value is non-empty and differs from the stored one.
pub fn get_or_create_league(
    conn: &Connection,
    name: Option<&str>,
    country: Option<&str>,
    flag_class: Option<&str>,
    logo_url: Option<&str>,
    now: &str,
) -> Result<Option<i64>> {
    let Some(name) = clean(name) else {
        return Ok(None);
    };
    let country = clean(country);
    let flag_class = clean(flag_class);
    let logo_url = clean(logo_url);

    let name_key = normalize_key(name);
    // absent country keys as '' so the UNIQUE pair still deduplicates
    let country_key = country.map(normalize_key).unwrap_or_default();

    let existing: Option<(i64, Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT id, flag_class, logo_url FROM leagues WHERE name_key = ?1 AND country_key = ?2",
            params![name_key, country_key],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()
        .with_context(|| format!("lookup league {name:?}"))?;

    if let Some((id, stored_flag, stored_logo)) = existing {
        let new_flag = flag_class.filter(|f| stored_flag.as_deref() != Some(*f));
        let new_logo = logo_url.filter(|l| stored_logo.as_deref() != Some(*l));
        if new_flag.is_some() || new_logo.is_some() {
            conn.execute(
                "UPDATE leagues SET
                    flag_class = COALESCE(?2, flag_class),
                    logo_url = COALESCE(?3, logo_url),
                    updated_at = ?4
                 WHERE id = ?1",
                params![id, new_flag, new_logo, now],
            )
            .with_context(|| format!("update league {id}"))?;
        }
        return Ok(Some(id));
    }

    conn.execute(
        "INSERT INTO leagues(name, country, name_key, country_key, flag_class, logo_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![name, country, name_key, country_key, flag_class, logo_url, now],
    )
    .with_context(|| format!("insert league {name:?}"))?;

    Ok(Some(conn.last_insert_rowid()))
}

/// Team id for `name`. Same logo rule as leagues.
pub fn get_or_create_team(
    conn: &Connection,
    name: Option<&str>,
    logo_url: Option<&str>,
    now: &str,
) -> Result<Option<i64>> {
    let Some(name) = clean(name) else {
        return Ok(None);
    };
    let logo_url = clean(logo_url);
    let name_key = normalize_key(name);

    let existing: Option<(i64, Option<String>)> = conn
        .query_row(
            "SELECT id, logo_url FROM teams WHERE name_key = ?1",
            params![name_key],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
        .with_context(|| format!("lookup team {name:?}"))?;

    if let Some((id, stored_logo)) = existing {
        if let Some(logo) = logo_url.filter(|l| stored_logo.as_deref() != Some(*l)) {
            conn.execute(
                "UPDATE teams SET logo_url = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, logo, now],
            )
            .with_context(|| format!("update team {id} logo"))?;
        }
        return Ok(Some(id));
    }

    conn.execute(
        "INSERT INTO teams(name, name_key, logo_url, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        params![name, name_key, logo_url, now],
    )
    .with_context(|| format!("insert team {name:?}"))?;

    Ok(Some(conn.last_insert_rowid()))
}
