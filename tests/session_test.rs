//! Integration tests for upload-mode sessions and the session data contract.

use std::io::{Cursor, Read};
use std::sync::Arc;

use topdf::{BatchCoordinator, Error, PdfOutput, PdfRenderer, RenderError};
use zip::ZipArchive;

fn stub_renderer() -> Arc<dyn PdfRenderer> {
    Arc::new(|html: &[u8], base_url: &str| -> Result<Vec<u8>, RenderError> {
        // Uploaded content has no directory to resolve against.
        assert_eq!(base_url, "");
        if String::from_utf8_lossy(html).contains("FAIL") {
            Err(RenderError::new("refused by renderer"))
        } else {
            Ok(b"%PDF-upload".to_vec())
        }
    })
}

fn upload(files: &[(&str, &str)]) -> Vec<(String, Vec<u8>)> {
    files
        .iter()
        .map(|(path, body)| (path.to_string(), body.as_bytes().to_vec()))
        .collect()
}

#[test]
fn test_upload_convert_buffers_pdfs() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    let report = coordinator
        .convert_uploaded(upload(&[
            ("site/index.html", "<html>home</html>"),
            ("site/sub/page.html", "<html>page</html>"),
            ("site/logo.png", "not html"),
        ]))
        .unwrap();

    assert_eq!(report.statistics.total, 2);
    assert_eq!(report.statistics.successful, 2);
    assert_eq!(report.statistics.success_rate, 100.0);

    for outcome in &report.outcomes {
        match &outcome.output {
            Some(PdfOutput::Memory(bytes)) => assert_eq!(bytes, b"%PDF-upload"),
            other => panic!("expected buffered PDF, got {:?}", other),
        }
    }

    let state = coordinator.snapshot();
    assert_eq!(state.scan_root.as_deref().unwrap().to_str(), Some("site"));
    assert!(state.output_root.is_none());
    assert_eq!(state.documents.len(), 2);
}

#[test]
fn test_upload_archive_reproduces_tree() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    coordinator
        .convert_uploaded(upload(&[
            ("site/index.html", "<html>home</html>"),
            ("site/sub/page.html", "<html>page</html>"),
        ]))
        .unwrap();

    let bytes = coordinator.build_archive().unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["site/index.pdf", "site/sub/page.pdf"]);

    let mut content = Vec::new();
    archive
        .by_name("site/index.pdf")
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    assert_eq!(content, b"%PDF-upload");

    assert_eq!(coordinator.archive_file_name(), "site_pdfs.zip");
}

#[test]
fn test_upload_without_documents_errors() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    let result = coordinator.convert_uploaded(upload(&[("site/logo.png", "binary")]));
    assert!(matches!(result, Err(Error::EmptySession)));
}

#[test]
fn test_upload_traversal_is_rejected() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    let result = coordinator.convert_uploaded(upload(&[("../escape.html", "<html></html>")]));
    assert!(matches!(result, Err(Error::InvalidRelativePath(_))));
}

#[test]
fn test_upload_failure_statistics() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    let report = coordinator
        .convert_uploaded(upload(&[
            ("good.html", "<html>ok</html>"),
            ("zbad.html", "<html>FAIL</html>"),
        ]))
        .unwrap();

    assert_eq!(report.statistics.total, 2);
    assert_eq!(report.statistics.successful, 1);
    assert_eq!(report.statistics.failed, 1);
    assert_eq!(report.statistics.success_rate, 50.0);
    assert!(report.outcomes[0].success);
    assert!(!report.outcomes[1].success);
}

#[test]
fn test_clear_resets_session() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    coordinator
        .convert_uploaded(upload(&[("index.html", "<html></html>")]))
        .unwrap();
    assert!(!coordinator.snapshot().is_empty());

    coordinator.clear();
    let state = coordinator.snapshot();
    assert!(state.is_empty());
    assert!(state.outcomes.is_empty());
    assert!(state.scanned_at.is_none());
}

#[test]
fn test_snapshot_carries_timestamps() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    coordinator
        .convert_uploaded(upload(&[("index.html", "<html></html>")]))
        .unwrap();

    let state = coordinator.snapshot();
    assert!(state.scanned_at.is_some());
    assert!(state.converted_at.is_some());
}

#[test]
fn test_snapshot_serializes_with_slash_paths() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    coordinator
        .convert_uploaded(upload(&[("site/sub/page.html", "<html>big body</html>")]))
        .unwrap();

    let json = serde_json::to_string(&coordinator.snapshot()).unwrap();
    assert!(json.contains("\"site/sub/page.html\""));
    assert!(json.contains("\"site/sub/page.pdf\""));
    assert!(json.contains("\"success\":true"));
    // Content bytes stay out of the transport payload.
    assert!(!json.contains("big body"));
    assert!(json.contains("memory_len"));
}

#[test]
fn test_statistics_match_state_snapshot() {
    let coordinator = BatchCoordinator::new(stub_renderer());
    let report = coordinator
        .convert_uploaded(upload(&[
            ("a.html", "<html></html>"),
            ("b.html", "<html>FAIL</html>"),
            ("c.html", "<html></html>"),
        ]))
        .unwrap();

    let state = coordinator.snapshot();
    assert_eq!(state.statistics(), report.statistics);
    assert_eq!(state.outcomes.len(), report.outcomes.len());
}
