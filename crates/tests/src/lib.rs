//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Contract snapshot tests
//! - Sinks over real pipes and files
//! - Configuration to dispatcher to file round trips

#[cfg(test)]
mod support {
    use std::fs::File;
    use std::os::fd::{FromRawFd, OwnedFd};

    /// Create a pipe, returning the read end as a `File` and the write end
    pub fn pipe() -> (File, OwnedFd) {
        let mut fds = [0; 2];
        // SAFETY: `fds` has room for the two descriptors pipe(2) returns.
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        // SAFETY: both descriptors were just created and are owned here.
        unsafe { (File::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{SinkState, WriteError, WriteErrorKind};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(SinkState::default(), SinkState::Unopened);
    }

    #[test]
    fn test_error_kinds_are_stable() {
        assert_eq!(
            WriteError::interrupted("s").kind(),
            WriteErrorKind::Interrupted
        );
        assert_eq!(WriteError::closed("s", 0, 1).kind(), WriteErrorKind::Closed);
        assert_eq!(
            WriteError::contract_violation("s", "x").kind(),
            WriteErrorKind::ContractViolation
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::io::Read;
    use std::os::fd::AsFd;
    use std::thread;

    use config_loader::{ConfigFormat, ConfigLoader};
    use handle_write::{
        create_dispatcher, write_one_str, BufferedWrite, HandleSink, SinkState, WriteErrorKind,
        WriteSink,
    };
    use observability::DispatchStats;
    use tempfile::tempdir;

    use super::support::pipe;

    /// A payload larger than the pipe buffer arrives complete and in order
    #[test]
    fn test_handle_sink_large_payload_over_pipe() {
        let (mut reader, writer) = pipe();
        let payload: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let reader_thread = thread::spawn(move || {
            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap();
            out
        });

        let mut sink = HandleSink::owned("pipe", writer);
        sink.open().unwrap();
        sink.write(&payload).unwrap();
        sink.close().unwrap();

        assert_eq!(reader_thread.join().unwrap(), expected);
    }

    #[test]
    fn test_write_one_str_over_pipe() {
        let (mut reader, writer) = pipe();
        write_one_str(&writer, "one\ntwo\n").unwrap();
        write_one_str(&writer, "three\n").unwrap();
        drop(writer);

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "one\ntwo\nthree\n");
    }

    /// Writing into a pipe with no reader is a hard failure, not a retry loop
    #[test]
    fn test_broken_pipe_fails_sink() {
        let (reader, writer) = pipe();
        drop(reader);

        let mut sink = HandleSink::new("orphan", writer.as_fd());
        sink.open().unwrap();

        let err = sink.write(b"lost").unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::IoFailure);
        assert_eq!(err.raw_os_error(), Some(libc::EPIPE));
        assert_eq!(sink.state(), SinkState::Failed);

        let err = sink.write(b"again").unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::ContractViolation);
        assert!(sink.close().is_ok());
    }

    #[test]
    fn test_buffered_sink_over_pipe() {
        let (mut reader, writer) = pipe();

        let mut sink = BufferedWrite::with_capacity(16, HandleSink::owned("buffered", writer));
        sink.open().unwrap();
        for i in 0..10 {
            sink.write_str_line(&format!("line {i}")).unwrap();
        }
        sink.close().unwrap();

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out.lines().count(), 10);
        assert!(out.starts_with("line 0\nline 1\n"));
        assert!(out.ends_with("line 9\n"));
    }

    /// Config file -> dispatcher -> dispatch -> bytes on disk
    #[test]
    fn test_config_to_file_fanout() {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("primary.log");
        let mirror = dir.path().join("mirror.log");

        let config_text = format!(
            r#"
[defaults]
buffer_size = 64

[[sinks]]
name = "primary"
target = {{ kind = "file", path = "{}", append = false }}

[[sinks]]
name = "mirror"
target = {{ kind = "file", path = "{}" }}

[[sinks]]
name = "scratch"
target = {{ kind = "memory", capacity = 4 }}
"#,
            primary.display(),
            mirror.display()
        );
        let config_path = dir.path().join("sinks.toml");
        fs::write(&config_path, config_text).unwrap();

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let mut dispatcher = create_dispatcher(&config).unwrap();
        dispatcher.open_all().unwrap();

        let mut stats = DispatchStats::new();
        for chunk in [&b"alpha\n"[..], b"beta\n", b"gamma\n"] {
            let outcome = dispatcher.dispatch(chunk);
            stats.update(
                chunk.len(),
                outcome.delivered,
                outcome.skipped,
                outcome.failures.iter().map(|(name, _)| name.as_str()),
            );
        }

        // The memory sink is buffered, so its overflow only surfaces on close.
        let failures = dispatcher.shutdown();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "scratch");
        assert_eq!(failures[0].1.kind(), WriteErrorKind::Closed);

        assert_eq!(stats.dispatches, 3);
        assert!(!stats.has_failures());

        let expected = "alpha\nbeta\ngamma\n";
        assert_eq!(fs::read_to_string(&primary).unwrap(), expected);
        assert_eq!(fs::read_to_string(&mirror).unwrap(), expected);
    }

    #[test]
    fn test_json_config_round_trip_builds_same_sinks() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.log");
        let toml_text = format!(
            "[[sinks]]\nname = \"out\"\ntarget = {{ kind = \"file\", path = \"{}\" }}\n",
            out.display()
        );

        let config = ConfigLoader::load_from_str(&toml_text, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let reloaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();

        let mut dispatcher = create_dispatcher(&reloaded).unwrap();
        assert_eq!(dispatcher.sink_names(), vec!["out"]);
        dispatcher.open_all().unwrap();
        assert!(dispatcher.dispatch(b"via json\n").is_success());
        assert!(dispatcher.shutdown().is_empty());

        assert_eq!(fs::read_to_string(&out).unwrap(), "via json\n");
    }

    /// An optional sink that cannot be opened is dropped; the rest still run
    #[test]
    fn test_optional_sink_skipped_when_unavailable() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.log");
        let unreachable = dir.path().join("no_such_dir").join("audit.log");
        let toml_text = format!(
            r#"
[[sinks]]
name = "audit"
target = {{ kind = "file", path = "{}" }}
optional = true

[[sinks]]
name = "out"
target = {{ kind = "file", path = "{}" }}
"#,
            unreachable.display(),
            out.display()
        );

        let config = ConfigLoader::load_from_str(&toml_text, ConfigFormat::Toml).unwrap();
        let mut dispatcher = create_dispatcher(&config).unwrap();
        assert_eq!(dispatcher.sink_names(), vec!["out"]);

        dispatcher.open_all().unwrap();
        assert!(dispatcher.dispatch(b"kept\n").is_success());
        assert!(dispatcher.shutdown().is_empty());
        assert_eq!(fs::read_to_string(&out).unwrap(), "kept\n");
        assert!(!unreachable.exists());
    }
}
