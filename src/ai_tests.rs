//! Tests for AI-assisted cleanup

#[cfg(test)]
mod tests {
    use crate::ai::*;
    use crate::collection::Collection;
    use crate::error::{Error, Result};
    use crate::m3u_parser::parse;
    use crate::models::EntryId;
    use std::collections::HashSet;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Mutex;
    use std::thread;

    /// Answers with a fixed transformation and records batch sizes
    struct FakeAssistant {
        fail: bool,
        empty: bool,
        seen: Mutex<Vec<usize>>,
    }

    impl FakeAssistant {
        fn new() -> Self {
            Self {
                fail: false,
                empty: false,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl AiAssistant for FakeAssistant {
        fn clean_names(&self, batch: &[NameItem]) -> Result<Vec<NameItem>> {
            self.seen.lock().unwrap().push(batch.len());
            if self.fail {
                return Err(Error::Network("connection reset".to_string()));
            }
            if self.empty {
                return Ok(Vec::new());
            }
            Ok(batch
                .iter()
                .map(|item| NameItem {
                    id: item.id.clone(),
                    name: item.name.replace(" FHD", ""),
                })
                .collect())
        }

        fn categorize(&self, batch: &[NameItem]) -> Result<Vec<GroupItem>> {
            self.seen.lock().unwrap().push(batch.len());
            if self.fail {
                return Err(Error::Network("connection reset".to_string()));
            }
            let mut out: Vec<GroupItem> = batch
                .iter()
                .map(|item| GroupItem {
                    id: item.id.clone(),
                    group: if item.name.contains("ESPN") { "Sports" } else { "News" }.to_string(),
                })
                .collect();
            // Hallucinated ids must be ignored
            out.push(GroupItem {
                id: EntryId::new().to_string(),
                group: "Ghost".to_string(),
            });
            out.push(GroupItem {
                id: "garbage".to_string(),
                group: "Ghost".to_string(),
            });
            Ok(out)
        }
    }

    fn collection(n: usize) -> Collection {
        let mut content = String::from("#EXTM3U\n");
        for i in 0..n {
            let name = if i % 2 == 0 { "ESPN FHD" } else { "CNN FHD" };
            content.push_str(&format!("#EXTINF:-1 group-title=\"Mixed\",{} {}\nhttp://x/{}.ts\n", name, i, i));
        }
        Collection::from_entries(parse(&content).unwrap())
    }

    #[test]
    fn test_clean_names_caps_batch_and_applies() {
        let mut c = collection(60);
        let ai = FakeAssistant::new();

        let renamed = clean_names(&mut c, &HashSet::new(), &ai, DEFAULT_BATCH_CAP).unwrap();

        assert_eq!(renamed, 50);
        assert_eq!(*ai.seen.lock().unwrap(), vec![50]);
        assert_eq!(c.entries()[0].name, "ESPN 0");
        assert_eq!(c.entries()[49].name, "CNN 49");
        assert_eq!(c.entries()[50].name, "ESPN FHD 50");
    }

    #[test]
    fn test_clean_names_only_touches_selection() {
        let mut c = collection(4);
        let selected: HashSet<EntryId> = [c.entries()[3].id()].into_iter().collect();
        let ai = FakeAssistant::new();

        assert_eq!(clean_names(&mut c, &selected, &ai, 50).unwrap(), 1);
        assert_eq!(c.entries()[3].name, "CNN 3");
        assert_eq!(c.entries()[1].name, "CNN FHD 1");
    }

    #[test]
    fn test_failure_leaves_collection_untouched() {
        let mut c = collection(3);
        let before: Vec<String> = c.entries().iter().map(|e| e.name.clone()).collect();
        let mut ai = FakeAssistant::new();
        ai.fail = true;

        assert!(matches!(clean_names(&mut c, &HashSet::new(), &ai, 50), Err(Error::Network(_))));
        let after: Vec<String> = c.entries().iter().map(|e| e.name.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_answer_is_no_suggestions() {
        let mut c = collection(3);
        let mut ai = FakeAssistant::new();
        ai.empty = true;

        assert!(matches!(clean_names(&mut c, &HashSet::new(), &ai, 50), Err(Error::NoSuggestions)));
        assert_eq!(c.entries()[0].name, "ESPN FHD 0");
    }

    #[test]
    fn test_job_phases_tolerate_deletion_before_apply() {
        let mut c = collection(4);
        let ai = FakeAssistant::new();
        let job = AiJob::Categorize;

        let batch = job.prepare(&c, &HashSet::new(), 50).unwrap();
        let updates = job.suggest(&ai, &batch).unwrap();
        assert_eq!(updates.len(), 4);

        let gone: HashSet<EntryId> = [c.entries()[0].id()].into_iter().collect();
        c.delete(&gone);
        assert_eq!(job.apply(&mut c, &updates), 3);
        assert_eq!(c.entries()[0].group(), "News");
        assert!(!c.has_group("Ghost"));
    }

    #[test]
    fn test_prepare_messages_name_the_job() {
        let c = Collection::new();
        let none = HashSet::new();
        let clean = AiJob::CleanNames.prepare(&c, &none, 50).unwrap_err();
        let group = AiJob::Categorize.prepare(&c, &none, 50).unwrap_err();
        assert_eq!(clean.to_string(), "No items to clean");
        assert_eq!(group.to_string(), "No items to categorize");
    }

    #[test]
    fn test_empty_collection_is_validation_error() {
        let mut c = Collection::new();
        let ai = FakeAssistant::new();
        assert!(matches!(categorize(&mut c, &HashSet::new(), &ai, 50), Err(Error::Validation(_))));
        assert!(ai.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_categorize_assigns_groups_and_ignores_unknown_ids() {
        let mut c = collection(4);
        let ai = FakeAssistant::new();

        assert_eq!(categorize(&mut c, &HashSet::new(), &ai, 50).unwrap(), 4);
        assert_eq!(c.entries()[0].group(), "Sports");
        assert_eq!(c.entries()[1].group(), "News");
        assert_eq!(c.entries()[1].raw_attributes()["group-title"], "News");
        assert!(!c.has_group("Ghost"));
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn test_updates_filter_blank_values() {
        let c = collection(2);
        let batch = build_batch(&c, &HashSet::new(), 50);
        let suggestions = vec![
            NameItem { id: batch[0].id.clone(), name: "  ".to_string() },
            NameItem { id: batch[1].id.clone(), name: " CNN ".to_string() },
        ];
        let updates = name_updates(&batch, suggestions).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[&c.entries()[1].id()], "CNN");
    }

    fn serve_json(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                // Read headers and body until the JSON payload closes
                while let Ok(n) = stream.read(&mut buf) {
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&request);
                    if let Some(idx) = text.find("\r\n\r\n") {
                        let len = text[..idx]
                            .lines()
                            .find_map(|l| {
                                let lower = l.to_lowercase();
                                lower.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap_or(0))
                            })
                            .unwrap_or(0);
                        if request.len() >= idx + 4 + len {
                            break;
                        }
                    }
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/v1beta", addr)
    }

    #[test]
    fn test_gemini_client_parses_candidate_text() {
        let endpoint = serve_json(
            r#"{"candidates":[{"content":{"parts":[{"text":"[{\"id\":\"a\",\"name\":\"CNN\"}]"}]}}]}"#,
        );
        let client = GeminiClient::new("test-key", DEFAULT_MODEL).with_endpoint(&endpoint);
        let batch = vec![NameItem { id: "a".to_string(), name: "CNN FHD".to_string() }];

        let result = client.clean_names(&batch).unwrap();
        assert_eq!(result, vec![NameItem { id: "a".to_string(), name: "CNN".to_string() }]);
    }

    #[test]
    fn test_gemini_client_malformed_answer_is_empty() {
        let endpoint = serve_json(r#"{"candidates":[{"content":{"parts":[{"text":"not json"}]}}]}"#);
        let client = GeminiClient::new("test-key", DEFAULT_MODEL).with_endpoint(&endpoint);
        let batch = vec![NameItem { id: "a".to_string(), name: "CNN".to_string() }];
        assert!(client.categorize(&batch).unwrap().is_empty());
    }
}
