//! Tests for import sources and export

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::m3u_parser::parse;
    use crate::sources::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::thread;

    const PLAYLIST: &str = "#EXTM3U\n#EXTINF:-1 group-title=\"News\",CNN HD\nhttp://x/1\n";

    fn login(host: &str, username: &str, password: &str) -> XtreamLogin {
        XtreamLogin {
            host: host.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_xtream_url_adds_scheme_and_strips_slash() {
        let url = login("provider.tv:8080/", "bob", "secret").playlist_url().unwrap();
        assert_eq!(
            url,
            "http://provider.tv:8080/get.php?username=bob&password=secret&type=m3u_plus&output=ts"
        );
    }

    #[test]
    fn test_xtream_url_keeps_https_and_encodes_credentials() {
        let url = login("https://p.tv", "a b", "p&w=1").playlist_url().unwrap();
        assert_eq!(
            url,
            "https://p.tv/get.php?username=a%20b&password=p%26w%3D1&type=m3u_plus&output=ts"
        );
    }

    #[test]
    fn test_xtream_credentials_sent_as_typed() {
        let url = login("  p.tv/ ", " bob", "pw ").playlist_url().unwrap();
        assert_eq!(
            url,
            "http://p.tv/get.php?username=%20bob&password=pw%20&type=m3u_plus&output=ts"
        );
    }

    #[test]
    fn test_xtream_requires_all_fields() {
        let err = login("p.tv", "", "x").playlist_url().unwrap_err();
        assert_eq!(err.to_string(), "Please fill all Xtream fields.");
        assert!(matches!(
            ImportSource::Xtream(login("  ", "u", "p")).validate(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_file_extension_validation() {
        for name in ["list.m3u", "LIST.M3U8", "list.m3u.gz"] {
            assert!(ImportSource::File(PathBuf::from(name)).validate().is_ok(), "{}", name);
        }
        for name in ["list.txt", "list.gz", "m3u"] {
            assert!(ImportSource::File(PathBuf::from(name)).validate().is_err(), "{}", name);
        }
        assert!(ImportSource::Url("   ".to_string()).validate().is_err());
    }

    #[test]
    fn test_describe_hides_password() {
        let source = ImportSource::Xtream(login("p.tv", "bob", "hunter2"));
        assert_eq!(source.describe(), "Xtream bob@p.tv");
        assert!(!source.describe().contains("hunter2"));
    }

    #[test]
    fn test_decode_body_plain_and_gzip() {
        assert_eq!(decode_body(PLAYLIST.as_bytes().to_vec()).unwrap(), PLAYLIST);
        assert_eq!(decode_body(gzip(PLAYLIST)).unwrap(), PLAYLIST);
        assert_eq!(decode_body(vec![b'a', 0xff, b'b']).unwrap(), "a\u{fffd}b");
    }

    #[test]
    fn test_read_file_sources() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("list.m3u");
        std::fs::write(&plain, PLAYLIST).unwrap();
        let packed = dir.path().join("list.m3u.gz");
        std::fs::write(&packed, gzip(PLAYLIST)).unwrap();

        let options = FetchOptions::default();
        assert_eq!(read_source(&ImportSource::File(plain), &options).unwrap(), PLAYLIST);
        assert_eq!(read_source(&ImportSource::File(packed), &options).unwrap(), PLAYLIST);

        let missing = dir.path().join("missing.m3u");
        assert!(matches!(read_source(&ImportSource::File(missing), &options), Err(Error::Io(_))));
    }

    #[test]
    fn test_save_playlist_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        let entries = parse(PLAYLIST).unwrap();

        save_playlist(&path, &entries).unwrap();
        let reread = parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread.len(), 1);
        assert!(reread[0].same_content(&entries[0]));
    }

    fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let head = format!(
                    "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status_line,
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
            }
        });
        format!("http://{}/playlist.m3u", addr)
    }

    #[test]
    fn test_fetch_url_plain_and_gzip() {
        let options = FetchOptions::default();
        let url = serve_once("HTTP/1.1 200 OK", PLAYLIST.as_bytes().to_vec());
        assert_eq!(fetch_url(&url, &options).unwrap(), PLAYLIST);

        let url = serve_once("HTTP/1.1 200 OK", gzip(PLAYLIST));
        assert_eq!(read_source(&ImportSource::Url(url), &options).unwrap(), PLAYLIST);
    }

    #[test]
    fn test_fetch_url_http_error() {
        let url = serve_once("HTTP/1.1 404 Not Found", Vec::new());
        let err = fetch_url(&url, &FetchOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.to_string().contains("404"));
    }
}
