use soonly::components::event_cache::{EventCache, JsonFileCacheStore};
use soonly::components::google_calendar::CalendarListEntry;
use soonly::components::GoogleCalendarHandle;
use soonly::config::{Config, ConfigStore, JsonConfigStore};
use soonly::error::{other_error, SoonlyResult};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::sync::RwLock;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    run().await?;
    Ok(())
}

async fn run() -> SoonlyResult<()> {
    let config = Config::load()?;
    let settings_store = Arc::new(JsonConfigStore::new(&config.settings_file));
    let cache = EventCache::new(Arc::new(JsonFileCacheStore::new(&config.cache_file)));

    let settings: Arc<dyn ConfigStore> = settings_store.clone();
    let calendar = GoogleCalendarHandle::new(Arc::new(RwLock::new(config)), settings);
    let calendars = calendar.list_calendars().await;
    calendar.shutdown().await?;
    let calendars = calendars?;

    if calendars.is_empty() {
        return Err(other_error("The account has no calendars"));
    }

    let current = settings_store.load()?.calendar_ids;
    println!("Select the calendars you wish to display:");
    for (index, entry) in calendars.iter().enumerate() {
        let marker = if current.contains(&entry.id) { "*" } else { " " };
        println!("{} {:>2}. {}", marker, index + 1, entry.display_name());
    }
    print!("Numbers separated by commas: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let selected = parse_selection(&line, &calendars)?;
    if selected.is_empty() {
        return Err(other_error("Please select at least one calendar."));
    }

    settings_store.set_calendar_ids(selected.clone())?;
    // The cached events belong to the old selection
    cache.invalidate()?;

    println!("Saved {} calendars to {}", selected.len(), settings_store.path().display());
    Ok(())
}

/// Turn `1, 3` into the ids of the first and third calendar
fn parse_selection(line: &str, calendars: &[CalendarListEntry]) -> SoonlyResult<Vec<String>> {
    let mut selected: Vec<String> = Vec::new();

    for part in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let number: usize = part
            .parse()
            .map_err(|_| other_error(&format!("Not a number: {}", part)))?;
        let entry = number
            .checked_sub(1)
            .and_then(|index| calendars.get(index))
            .ok_or_else(|| other_error(&format!("No calendar number {}", number)))?;

        if !selected.contains(&entry.id) {
            selected.push(entry.id.clone());
        }
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendars() -> Vec<CalendarListEntry> {
        ["work", "home", "holidays"]
            .iter()
            .map(|id| CalendarListEntry {
                id: id.to_string(),
                summary: Some(id.to_uppercase()),
                primary: false,
            })
            .collect()
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(
            parse_selection("1, 3\n", &calendars()).unwrap(),
            vec!["work".to_string(), "holidays".to_string()]
        );
        assert_eq!(parse_selection("2,2", &calendars()).unwrap(), vec!["home".to_string()]);
        assert!(parse_selection("\n", &calendars()).unwrap().is_empty());
        assert!(parse_selection("0", &calendars()).is_err());
        assert!(parse_selection("4", &calendars()).is_err());
        assert!(parse_selection("two", &calendars()).is_err());
    }
}
