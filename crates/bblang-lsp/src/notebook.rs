//! Notebook documents.
//!
//! A notebook is an ordered list of cells, and each cell is an ordinary
//! document in the [`DocumentStore`]. Structural edits change the cell list;
//! text edits go to the cell's document.

use bblang_core::keywords::LANGUAGE_ID;
use bblang_core::FileUri;
use lsp_types::TextDocumentContentChangeEvent;
use serde::Deserialize;

use crate::documents::DocumentStore;
use crate::error::DocumentError;

/// Whether a cell holds markup or code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum NotebookCellKind {
    /// Markdown or other prose.
    Markup,
    /// Source code.
    Code,
}

impl TryFrom<u8> for NotebookCellKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Markup),
            2 => Ok(Self::Code),
            other => Err(format!("invalid notebook cell kind {other}")),
        }
    }
}

/// A cell of a notebook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookCell {
    /// Markup or code.
    pub kind: NotebookCellKind,
    /// URI of the document holding the cell text.
    pub document: FileUri,
}

/// A document identified by URI only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentIdentifier {
    /// The document URI.
    pub uri: FileUri,
}

/// A document identified by URI and version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionedDocumentIdentifier {
    /// The document URI.
    pub uri: FileUri,
    /// The document version.
    pub version: i32,
}

/// A cell's text document as sent on open.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTextDocument {
    /// The cell document URI.
    pub uri: FileUri,
    /// The cell language.
    pub language_id: String,
    /// The cell version.
    pub version: i32,
    /// The cell text.
    pub text: String,
}

/// The notebook as sent on open.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookDocumentItem {
    /// The notebook URI.
    pub uri: FileUri,
    /// The notebook type, like `jupyter-notebook`.
    pub notebook_type: String,
    /// The notebook version.
    pub version: i32,
    /// Its cells, in order.
    pub cells: Vec<NotebookCell>,
}

/// Parameters of `notebookDocument/didOpen`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidOpenNotebookParams {
    /// The opened notebook.
    pub notebook_document: NotebookDocumentItem,
    /// The text of its cells.
    pub cell_text_documents: Vec<CellTextDocument>,
}

/// Cells removed and inserted at one place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellArrayChange {
    /// First affected cell.
    pub start: u32,
    /// Number of cells removed.
    pub delete_count: u32,
    /// Cells inserted at `start`.
    #[serde(default)]
    pub cells: Option<Vec<NotebookCell>>,
}

/// A change to the cell list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStructureChange {
    /// The splice of the cell list.
    pub array: CellArrayChange,
    /// Cell documents opened by the change.
    #[serde(default)]
    pub did_open: Option<Vec<CellTextDocument>>,
    /// Cell documents closed by the change.
    #[serde(default)]
    pub did_close: Option<Vec<DocumentIdentifier>>,
}

/// A text change of one cell.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTextChange {
    /// The changed cell document.
    pub document: VersionedDocumentIdentifier,
    /// Its content changes.
    pub changes: Vec<TextDocumentContentChangeEvent>,
}

/// Everything that changed about the cells.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellChanges {
    /// A change to the cell list.
    #[serde(default)]
    pub structure: Option<CellStructureChange>,
    /// Cells whose properties changed.
    #[serde(default)]
    pub data: Option<Vec<NotebookCell>>,
    /// Cells whose text changed.
    #[serde(default)]
    pub text_content: Option<Vec<CellTextChange>>,
}

/// A change to a notebook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookChange {
    /// Changes to the cells.
    #[serde(default)]
    pub cells: Option<CellChanges>,
}

/// Parameters of `notebookDocument/didChange`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidChangeNotebookParams {
    /// The notebook and its new version.
    pub notebook_document: VersionedDocumentIdentifier,
    /// What changed.
    pub change: NotebookChange,
}

/// Parameters of `notebookDocument/didSave`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidSaveNotebookParams {
    /// The saved notebook.
    pub notebook_document: DocumentIdentifier,
}

/// Parameters of `notebookDocument/didClose`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidCloseNotebookParams {
    /// The closed notebook.
    pub notebook_document: DocumentIdentifier,
    /// The cell documents closed with it.
    #[serde(default)]
    pub cell_text_documents: Vec<DocumentIdentifier>,
}

/// An open notebook.
#[derive(Debug, Clone)]
pub struct Notebook {
    uri: FileUri,
    language_id: String,
    notebook_type: Option<String>,
    version: Option<i32>,
    cells: Vec<NotebookCell>,
}

impl Notebook {
    /// Create an empty notebook.
    pub fn new(uri: FileUri) -> Self {
        Self {
            uri,
            language_id: LANGUAGE_ID.to_string(),
            notebook_type: None,
            version: None,
            cells: Vec::new(),
        }
    }

    /// The notebook URI.
    pub const fn uri(&self) -> &FileUri {
        &self.uri
    }

    /// Language of the notebook's code cells.
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// The notebook type, once opened.
    pub fn notebook_type(&self) -> Option<&str> {
        self.notebook_type.as_deref()
    }

    /// The last version the editor reported.
    pub const fn version(&self) -> Option<i32> {
        self.version
    }

    /// Cells in order.
    pub fn cells(&self) -> &[NotebookCell] {
        &self.cells
    }
}

impl DocumentStore {
    /// Look a notebook up by exact URI.
    pub fn try_get_notebook(&self, uri: &FileUri) -> Option<&Notebook> {
        self.notebooks.iter().find(|notebook| notebook.uri() == uri)
    }

    /// Return the notebook for `uri`, registering it first if needed.
    pub fn get_or_create_notebook(&mut self, uri: &FileUri) -> &mut Notebook {
        self.remove_duplicates();

        let index = match self.notebooks.iter().position(|notebook| notebook.uri() == uri) {
            Some(index) => index,
            None => {
                tracing::debug!("[Docs] Register notebook ({})", uri);
                self.notebooks.push(Notebook::new(uri.clone()));
                self.notebooks.len() - 1
            }
        };
        &mut self.notebooks[index]
    }

    /// The editor opened a notebook. Returns the cell documents that were
    /// opened.
    pub fn open_notebook(
        &mut self,
        params: &DidOpenNotebookParams,
    ) -> Result<Vec<FileUri>, DocumentError> {
        let item = &params.notebook_document;
        tracing::debug!("[NotebookBuffer] Opened ({})", item.uri);

        let mut opened = Vec::new();
        for cell in &params.cell_text_documents {
            self.open_cell(cell)?;
            opened.push(cell.uri.clone());
        }

        let notebook = self.get_or_create_notebook(&item.uri);
        notebook.cells.clone_from(&item.cells);
        notebook.notebook_type = Some(item.notebook_type.clone());
        notebook.language_id = LANGUAGE_ID.to_string();
        notebook.version = Some(item.version);

        Ok(opened)
    }

    /// The editor changed a notebook. Returns the cell documents whose text
    /// was opened or changed.
    pub fn change_notebook(
        &mut self,
        params: &DidChangeNotebookParams,
    ) -> Result<Vec<FileUri>, DocumentError> {
        let uri = &params.notebook_document.uri;
        tracing::debug!("[NotebookBuffer] Changed ({})", uri);

        let mut touched = Vec::new();
        let changes = params.change.cells.clone().unwrap_or_default();

        if let Some(structure) = &changes.structure {
            let array = &structure.array;
            let notebook = self.get_or_create_notebook(uri);
            let start = (array.start as usize).min(notebook.cells.len());
            let end = start
                .saturating_add(array.delete_count as usize)
                .min(notebook.cells.len());
            tracing::debug!("[NotebookBuffer]  - Removing {} cells from {}", end - start, start);
            let inserted = array.cells.clone().unwrap_or_default();
            tracing::debug!("[NotebookBuffer]  - Inserting {} cells at {}", inserted.len(), start);
            let _removed: Vec<_> = notebook.cells.splice(start..end, inserted).collect();

            for closed in structure.did_close.iter().flatten() {
                let notebook = self.get_or_create_notebook(uri);
                match notebook
                    .cells
                    .iter()
                    .position(|cell| cell.document == closed.uri)
                {
                    Some(index) => {
                        notebook.cells.remove(index);
                    }
                    None => {
                        tracing::warn!(
                            "Failed to apply cell remove: cell {} not found in notebook {}",
                            closed.uri,
                            uri
                        );
                        continue;
                    }
                }
                self.remove(&closed.uri);
            }

            for cell in structure.did_open.iter().flatten() {
                self.open_cell(cell)?;
                touched.push(cell.uri.clone());
            }
        }

        if let Some(data) = &changes.data {
            let notebook = self.get_or_create_notebook(uri);
            for cell in data {
                match notebook
                    .cells
                    .iter_mut()
                    .find(|existing| existing.document == cell.document)
                {
                    Some(existing) => existing.clone_from(cell),
                    None => tracing::warn!(
                        "Failed to set cell data: cell {} not found in notebook {}",
                        cell.document,
                        uri
                    ),
                }
            }
        }

        for text in changes.text_content.iter().flatten() {
            let document =
                self.get_or_create_with_language(&text.document.uri, LANGUAGE_ID, None)?;
            document.on_changed(&text.changes, text.document.version);
            touched.push(text.document.uri.clone());
        }

        let notebook = self.get_or_create_notebook(uri);
        notebook.version = Some(params.notebook_document.version);

        Ok(touched)
    }

    /// The editor saved a notebook.
    pub fn save_notebook(&mut self, params: &DidSaveNotebookParams) {
        let uri = &params.notebook_document.uri;
        tracing::debug!("[NotebookBuffer] Saved ({})", uri);
        self.get_or_create_notebook(uri);
    }

    fn open_cell(&mut self, cell: &CellTextDocument) -> Result<(), DocumentError> {
        tracing::debug!("[NotebookBuffer]    - Opening cell {}", cell.uri);
        self.get_or_create_with_language(&cell.uri, &cell.language_id, Some(&cell.text))?
            .on_opened(&cell.text, cell.version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cell(uri: &str) -> serde_json::Value {
        json!({ "kind": 2, "document": uri })
    }

    fn cell_document(uri: &str, text: &str) -> serde_json::Value {
        json!({ "uri": uri, "languageId": "bbc", "version": 1, "text": text })
    }

    fn open(store: &mut DocumentStore) {
        let params: DidOpenNotebookParams = serde_json::from_value(json!({
            "notebookDocument": {
                "uri": "file:///book.ipynb",
                "notebookType": "jupyter-notebook",
                "version": 1,
                "cells": [cell("cell:a"), cell("cell:b")]
            },
            "cellTextDocuments": [
                cell_document("cell:a", "int a = 1;"),
                cell_document("cell:b", "int b = 2;")
            ]
        }))
        .unwrap();
        let opened = store.open_notebook(&params).unwrap();
        assert_eq!(opened.len(), 2);
    }

    #[test]
    fn test_open_notebook_registers_cells() {
        let mut store = DocumentStore::new();
        open(&mut store);

        let notebook = store.try_get_notebook(&FileUri::new("file:///book.ipynb")).unwrap();
        assert_eq!(notebook.cells().len(), 2);
        assert_eq!(notebook.notebook_type(), Some("jupyter-notebook"));
        assert_eq!(
            store
                .try_get(&FileUri::new("cell:b"))
                .and_then(|d| d.text())
                .as_deref(),
            Some("int b = 2;")
        );
    }

    #[test]
    fn test_structure_change_clamps_and_closes() {
        let mut store = DocumentStore::new();
        open(&mut store);

        let params: DidChangeNotebookParams = serde_json::from_value(json!({
            "notebookDocument": { "uri": "file:///book.ipynb", "version": 2 },
            "change": {
                "cells": {
                    "structure": {
                        "array": { "start": 5, "deleteCount": 3, "cells": [cell("cell:c")] },
                        "didOpen": [cell_document("cell:c", "int c;")],
                        "didClose": [{ "uri": "cell:a" }, { "uri": "cell:zz" }]
                    }
                }
            }
        }))
        .unwrap();
        let touched = store.change_notebook(&params).unwrap();
        assert_eq!(touched, vec![FileUri::new("cell:c")]);

        let notebook = store.try_get_notebook(&FileUri::new("file:///book.ipynb")).unwrap();
        let cells: Vec<_> = notebook.cells().iter().map(|c| c.document.as_str()).collect();
        assert_eq!(cells, vec!["cell:b", "cell:c"]);
        assert_eq!(notebook.version(), Some(2));
        assert!(store.try_get(&FileUri::new("cell:a")).is_none());
    }

    #[test]
    fn test_text_change_goes_to_cell_document() {
        let mut store = DocumentStore::new();
        open(&mut store);

        let params: DidChangeNotebookParams = serde_json::from_value(json!({
            "notebookDocument": { "uri": "file:///book.ipynb", "version": 3 },
            "change": {
                "cells": {
                    "textContent": [{
                        "document": { "uri": "cell:a", "version": 2 },
                        "changes": [{ "text": "int a = 10;" }]
                    }]
                }
            }
        }))
        .unwrap();
        store.change_notebook(&params).unwrap();

        let document = store.try_get(&FileUri::new("cell:a")).unwrap();
        assert_eq!(document.text().as_deref(), Some("int a = 10;"));
        assert_eq!(document.version(), Some(2));
    }

    #[test]
    fn test_remove_drops_notebook() {
        let mut store = DocumentStore::new();
        open(&mut store);
        assert!(store.remove(&FileUri::new("file:///book.ipynb")));
        assert!(store.try_get_notebook(&FileUri::new("file:///book.ipynb")).is_none());
    }
}
