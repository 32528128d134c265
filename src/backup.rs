//! Backup run orchestration.
//!
//! A run authenticates once, lists boards once, and then for every open board
//! saves its export and downloads the assets it references. The first error
//! ends the run; files written before it stay on disk.

use crate::assets::{AssetDownloader, AssetExtractor, DownloadOutcome};
use crate::account::AccountQuery;
use crate::config::Config;
use crate::error::{ResultExt, Result, Step};
use crate::export::{BoardExporter, export_filename, save_export};
use crate::progress::Progress;
use crate::session::{Session, SessionEstablisher};
use crate::types::{AssetKind, BackupSummary, Board, Event, Username};
use chrono::NaiveDateTime;
use tracing::info;

/// Drives one complete backup run
pub struct BackupOrchestrator {
    config: Config,
    session: Session,
    login: Box<dyn SessionEstablisher>,
    progress: Box<dyn Progress>,
    extractor: AssetExtractor,
}

impl BackupOrchestrator {
    /// Prepare a run
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(
        config: Config,
        login: Box<dyn SessionEstablisher>,
        progress: Box<dyn Progress>,
    ) -> Result<Self> {
        config.validate()?;
        let session = Session::new(&config)?;
        let extractor = AssetExtractor::new(&config)?;
        Ok(Self {
            config,
            session,
            login,
            progress,
            extractor,
        })
    }

    /// The session used by this run
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the backup, stamping export files with the current local time
    pub async fn run(&self) -> Result<BackupSummary> {
        self.run_at(chrono::Local::now().naive_local()).await
    }

    /// Run the backup, stamping export files with `timestamp`
    pub async fn run_at(&self, timestamp: NaiveDateTime) -> Result<BackupSummary> {
        self.login
            .establish(&self.session, self.progress.as_ref())
            .await?;

        let account = AccountQuery::new(&self.session);
        let username = account.fetch_username().await.at(Step::Username)?;
        self.progress.emit(Event::LoggedIn {
            username: username.clone(),
        });

        self.progress.emit(Event::FetchingBoards);
        let boards = account.fetch_boards().await.at(Step::Boards)?;

        let mut summary = BackupSummary::default();
        for board in boards {
            if board.closed {
                info!(board = %board.id, "skipping closed board");
                self.progress.emit(Event::SkippedClosedBoard { board });
                summary.boards_skipped += 1;
                continue;
            }
            self.back_up_board(&board, &username, &timestamp, &mut summary)
                .await?;
        }

        info!(
            boards = summary.boards_backed_up,
            skipped = summary.boards_skipped,
            downloaded = summary.assets_downloaded,
            present = summary.assets_present,
            "backup complete"
        );
        self.progress.emit(Event::Complete);
        Ok(summary)
    }

    async fn back_up_board(
        &self,
        board: &Board,
        username: &Username,
        timestamp: &NaiveDateTime,
        summary: &mut BackupSummary,
    ) -> Result<()> {
        self.progress.emit(Event::BackingUp {
            board: board.clone(),
        });

        self.progress.emit(Event::SavingExport);
        let export = BoardExporter::new(&self.session)
            .fetch_export(board)
            .await
            .at(Step::BoardExport)?;
        let filename = export_filename(timestamp, username, board);
        let path = save_export(&self.config.output_dir, &filename, &export)
            .await
            .at(Step::SaveExport)?;
        info!(board = %board.id, path = %path.display(), "export saved");
        summary.boards_backed_up += 1;

        let downloader = AssetDownloader::new(&self.session, &self.config.output_dir);
        for kind in AssetKind::ALL {
            self.progress.emit(Event::DownloadingKind { kind });
            for asset in self.extractor.extract(&export, kind) {
                self.progress.emit(Event::DownloadingAsset {
                    asset: asset.clone(),
                });
                match downloader
                    .download(&asset)
                    .await
                    .at(Step::Asset(kind.singular()))?
                {
                    DownloadOutcome::AlreadyPresent(_) => summary.assets_present += 1,
                    DownloadOutcome::Downloaded { .. } => summary.assets_downloaded += 1,
                }
            }
        }
        Ok(())
    }
}
