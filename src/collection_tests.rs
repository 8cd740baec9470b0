//! Tests for collection mutations

#[cfg(test)]
mod tests {
    use crate::collection::*;
    use crate::error::Error;
    use crate::m3u_parser::parse;
    use crate::models::{Category, EntryId, StreamStatus};
    use std::collections::{HashMap, HashSet};

    const PLAYLIST: &str = r#"#EXTM3U
#EXTINF:-1 group-title="News",CNN
http://x/live/1.ts
#EXTINF:-1 group-title="News",BBC
http://x/live/2.ts
#EXTINF:-1 group-title="Sports",ESPN
http://x/live/3.ts
#EXTINF:-1 group-title="Films",Heat
http://x/movie/4.mkv
"#;

    fn collection() -> Collection {
        Collection::from_entries(parse(PLAYLIST).unwrap())
    }

    fn ids_of(c: &Collection, names: &[&str]) -> HashSet<EntryId> {
        c.entries()
            .iter()
            .filter(|e| names.contains(&e.name.as_str()))
            .map(|e| e.id())
            .collect()
    }

    fn names(c: &Collection) -> Vec<&str> {
        c.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_add_all_replaces_everything() {
        let mut c = collection();
        c.create_empty_group("Empty").unwrap();
        c.add_all(parse("#EXTM3U\n#EXTINF:-1,Only\nhttp://x/9\n").unwrap());
        assert_eq!(names(&c), vec!["Only"]);
        assert!(c.custom_groups().is_empty());
    }

    #[test]
    fn test_delete_keeps_order_of_the_rest() {
        let mut c = collection();
        let ids = ids_of(&c, &["BBC"]);
        assert_eq!(c.delete(&ids), 1);
        assert_eq!(names(&c), vec!["CNN", "ESPN", "Heat"]);
    }

    #[test]
    fn test_move_to_group_keeps_count_and_syncs_attribute() {
        let mut c = collection();
        let ids = ids_of(&c, &["CNN", "ESPN"]);
        let before: Vec<EntryId> = c.entries().iter().map(|e| e.id()).collect();

        assert_eq!(c.move_to_group(&ids, "Favorites").unwrap(), 2);

        assert_eq!(c.len(), 4);
        let after: Vec<EntryId> = c.entries().iter().map(|e| e.id()).collect();
        assert_eq!(before, after);
        for entry in c.entries().iter().filter(|e| ids.contains(&e.id())) {
            assert_eq!(entry.group(), "Favorites");
            assert_eq!(entry.raw_attributes()["group-title"], "Favorites");
        }
        assert_eq!(c.entries()[1].group(), "News");
    }

    #[test]
    fn test_move_to_blank_group_is_rejected() {
        let mut c = collection();
        let ids = ids_of(&c, &["CNN"]);
        assert!(matches!(c.move_to_group(&ids, "   "), Err(Error::Validation(_))));
        assert_eq!(c.entries()[0].group(), "News");
    }

    #[test]
    fn test_copy_to_group_appends_copies() {
        let mut c = collection();
        let ids = ids_of(&c, &["CNN", "Heat"]);

        assert_eq!(c.copy_to_group(&ids, "Favorites").unwrap(), 2);

        assert_eq!(c.len(), 6);
        assert_eq!(names(&c), vec!["CNN", "BBC", "ESPN", "Heat", "CNN (Copy)", "Heat (Copy)"]);
        assert_eq!(c.entries()[0].group(), "News");
        assert_eq!(c.entries()[4].group(), "Favorites");
        assert_eq!(c.entries()[5].category, Category::Movie);
        let unique: HashSet<EntryId> = c.entries().iter().map(|e| e.id()).collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_rename_group_relabels_entries_and_custom_list() {
        let mut c = collection();
        c.create_empty_group("Kids").unwrap();

        assert_eq!(c.rename_group("News", "World News"), 2);
        assert_eq!(c.rename_group("Kids", "Children"), 0);

        assert!(c.entries()[..2].iter().all(|e| e.group() == "World News"));
        assert!(c.entries()[..2]
            .iter()
            .all(|e| e.raw_attributes()["group-title"] == "World News"));
        assert_eq!(c.custom_groups(), ["Children".to_string()]);
        assert!(!c.has_group("News"));
    }

    #[test]
    fn test_rename_group_noops() {
        let mut c = collection();
        assert_eq!(c.rename_group("News", "News"), 0);
        assert_eq!(c.rename_group("News", "  "), 0);
        assert!(c.has_group("News"));
    }

    #[test]
    fn test_rename_group_keeps_name_as_typed() {
        let mut c = collection();
        assert_eq!(c.rename_group("News", " World "), 2);
        assert!(c.has_group(" World "));
        assert_eq!(c.entries()[0].group(), " World ");
    }

    #[test]
    fn test_rename_into_existing_group_merges() {
        let mut c = collection();
        c.create_empty_group("Kids").unwrap();
        c.create_empty_group("Children").unwrap();
        c.rename_group("Kids", "Children");
        assert_eq!(c.custom_groups(), ["Children".to_string()]);
        c.rename_group("Sports", "News");
        assert_eq!(c.group_counts()["News"], 3);
    }

    #[test]
    fn test_delete_group_cascades() {
        let mut c = collection();
        c.create_empty_group("Empty").unwrap();

        assert_eq!(c.delete_group("News"), 2);
        assert_eq!(names(&c), vec!["ESPN", "Heat"]);
        assert!(!c.all_groups().contains(&"News".to_string()));

        assert_eq!(c.delete_group("Empty"), 0);
        assert!(c.custom_groups().is_empty());
    }

    #[test]
    fn test_create_empty_group_duplicate() {
        let mut c = collection();
        assert!(matches!(c.create_empty_group("Sports"), Err(Error::DuplicateGroup(_))));

        c.create_empty_group("Kids").unwrap();
        assert!(matches!(c.create_empty_group(" Kids "), Err(Error::DuplicateGroup(_))));
        assert!(matches!(c.create_empty_group(""), Err(Error::Validation(_))));
        assert_eq!(c.custom_groups().len(), 1);
    }

    #[test]
    fn test_all_groups_and_counts_include_custom() {
        let mut c = collection();
        c.create_empty_group("Kids").unwrap();
        assert_eq!(c.all_groups(), vec!["Films", "Kids", "News", "Sports"]);
        let counts = c.group_counts();
        assert_eq!(counts["News"], 2);
        assert_eq!(counts["Kids"], 0);
    }

    #[test]
    fn test_bulk_assign_category_and_rename() {
        let mut c = collection();
        let cnn = c.entries()[0].id();
        let heat = c.entries()[3].id();

        let mut groups = HashMap::new();
        groups.insert(cnn, "Entertainment".to_string());
        groups.insert(heat, " ".to_string());
        groups.insert(EntryId::new(), "Ghost".to_string());
        assert_eq!(c.bulk_assign_category(&groups), 1);
        assert_eq!(c.get(cnn).unwrap().group(), "Entertainment");
        assert_eq!(c.get(cnn).unwrap().raw_attributes()["group-title"], "Entertainment");
        assert_eq!(c.get(heat).unwrap().group(), "Films");

        let mut new_names = HashMap::new();
        new_names.insert(heat, "Heat (1995)".to_string());
        assert_eq!(c.bulk_rename(&new_names), 1);
        assert_eq!(c.get(heat).unwrap().name, "Heat (1995)");
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn test_status_write_back() {
        let mut c = collection();
        let ids = ids_of(&c, &["CNN", "BBC"]);
        c.mark_checking(&ids);
        assert_eq!(c.entries()[0].status, StreamStatus::Checking);

        let mut results = HashMap::new();
        results.insert(c.entries()[0].id(), StreamStatus::Online);
        results.insert(c.entries()[1].id(), StreamStatus::Offline);
        assert_eq!(c.apply_statuses(&results), 2);
        assert_eq!(c.entries()[0].status, StreamStatus::Online);
        assert_eq!(c.entries()[1].status, StreamStatus::Offline);
        assert_eq!(c.entries()[2].status, StreamStatus::Unknown);
    }

    #[test]
    fn test_copy_made_during_check_is_not_left_checking() {
        let mut c = collection();
        let ids = ids_of(&c, &["CNN"]);
        c.mark_checking(&ids);
        c.copy_to_group(&ids, "Favorites").unwrap();

        let results: HashMap<_, _> = ids.iter().map(|id| (*id, StreamStatus::Online)).collect();
        c.apply_statuses(&results);

        let statuses: Vec<(&str, StreamStatus)> = c
            .entries()
            .iter()
            .filter(|e| e.name.starts_with("CNN"))
            .map(|e| (e.name.as_str(), e.status))
            .collect();
        assert_eq!(
            statuses,
            [("CNN", StreamStatus::Online), ("CNN (Copy)", StreamStatus::Unknown)]
        );
    }

    #[test]
    fn test_set_category() {
        let mut c = collection();
        let ids = ids_of(&c, &["ESPN"]);
        assert_eq!(c.set_category(&ids, Category::Other), 1);
        assert_eq!(c.entries()[2].category, Category::Other);
    }
}
