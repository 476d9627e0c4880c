//! Terminal rendering: aligned text by default, JSON with `--json`

use anyhow::Result;
use engine::Member;
use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn member_line(member: &Member) -> String {
    format!("#{:<6} id {:<20} score {}", member.rank, member.id, member.score)
}

pub fn print_members(members: &[Member], json: bool) -> Result<()> {
    if json {
        return print_json(members);
    }
    if members.is_empty() {
        println!("(no members)");
    }
    for member in members {
        println!("{}", member_line(member));
    }
    Ok(())
}

/// `what` describes the lookup for the not-found message
pub fn print_member(member: Option<&Member>, what: &str, json: bool) -> Result<()> {
    if json {
        return print_json(&member);
    }
    match member {
        Some(member) => println!("{}", member_line(member)),
        None => println!("No member {what}"),
    }
    Ok(())
}

pub fn print_count(label: &str, value: u64, json: bool) -> Result<()> {
    if json {
        let mut object = serde_json::Map::new();
        object.insert(label.to_string(), value.into());
        return print_json(&object);
    }
    println!("{label}: {value}");
    Ok(())
}
