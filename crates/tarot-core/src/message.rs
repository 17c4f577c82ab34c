//! Typed catalog of user-facing strings.
//!
//! Every message is a variant with exactly the arguments it formats, so a
//! missing translation or a wrong argument count is a compile error rather
//! than a runtime lookup miss.

use crate::error::DrawError;
use crate::locale::Locale;

/// A user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Application title.
    AppTitle,
    /// One-line tagline under the title.
    AppSubtitle,
    /// Heading of the global error banner.
    ErrorOccurred,
    /// Retry action on the error banner.
    TryAgain,
    /// Generic loading indicator.
    Loading,
    /// Placeholder while the interpretation is generated.
    GeneratingReading,
    /// Placeholder while the reading is assembled.
    GeneratingReadingDefault,
    /// Placeholder while card images are generated.
    GeneratingImages,
    /// Placeholder while the oracle summary is generated.
    GeneratingOracle,
    /// The oracle summary could not be generated.
    OracleFailed,
    /// The interpretation could not be generated.
    InterpretationFailed,
    /// The interpretation is unusable, so no oracle summary was requested.
    PartialInterpretationOracleFailed,
    /// Generic interpretation failure.
    ErrorGetInterpretation,
    /// Something went wrong internally; start over.
    InternalErrorRetry,
    /// The summary card could not be exported.
    DownloadFailed,
    /// The summary card is not ready for export.
    DownloadNotReady,
    /// Title of the credential prompt.
    CredentialTitle,
    /// Explains how the credential is used.
    CredentialInstruction,
    /// The credential field was left empty.
    CredentialRequired,
    /// The engine has no valid credential.
    EngineNotConfigured,
    /// The engine call failed.
    EngineCallFailed,
    /// Footer note on credential handling.
    CredentialNote,
    /// Title of the spread menu.
    SelectSpreadTitle,
    /// Card count badge of a spread.
    SpreadCardCount {
        /// Cards in the spread.
        count: usize,
    },
    /// Disclaimer under the spread menu.
    TarotDisclaimer,
    /// Title of the question prompt.
    QuestionTitle,
    /// Example question.
    QuestionPlaceholder,
    /// The question field was left empty.
    QuestionRequired,
    /// Back action.
    GoBack,
    /// Title of the card number prompt.
    CardNumberTitle,
    /// Instruction for the card number prompt.
    CardNumberInstruction {
        /// Numbers to enter.
        count: usize,
    },
    /// Label of one card slot.
    CardLabel {
        /// 1-based slot.
        index: usize,
    },
    /// A card slot was left empty.
    MissingNumber {
        /// 1-based slot.
        position: usize,
    },
    /// A card slot held an invalid number.
    InvalidNumber {
        /// Raw input.
        input: String,
        /// 1-based slot.
        position: usize,
    },
    /// A number was entered twice.
    DuplicateNumber {
        /// The repeated number.
        number: usize,
    },
    /// The wrong number of slots was submitted.
    WrongCount {
        /// Numbers required.
        expected: usize,
    },
    /// Title of the reading view.
    ReadingTitle,
    /// Label before the question.
    YourQuestion,
    /// Label before the spread name.
    SpreadLabel,
    /// Label before the drawn cards.
    DrawnCards,
    /// Label before the interpretation.
    InterpretationLabel,
    /// Export action.
    DownloadSummary,
    /// Start-over action.
    NewReading,
    /// Per-card image placeholder while generating.
    ImageGenerating,
    /// Per-card image placeholder after failure.
    ImageFailed,
    /// Title of the summary card.
    SummaryCardTitle,
    /// Label before the oracle text.
    OracleLabel,
    /// Footer of the summary card.
    SummaryCardFooter,
    /// The summary card was written to disk.
    SummarySaved {
        /// Destination path.
        path: String,
    },
}

/// Messages that stand in for engine output and must never be mistaken for it.
const RESERVED: &[Message] = &[
    Message::GeneratingReading,
    Message::GeneratingReadingDefault,
    Message::GeneratingOracle,
    Message::OracleFailed,
    Message::InterpretationFailed,
    Message::PartialInterpretationOracleFailed,
    Message::ErrorGetInterpretation,
    Message::EngineNotConfigured,
    Message::EngineCallFailed,
];

fn pick(locale: Locale, en: &str, zh: &str) -> String {
    match locale {
        Locale::En => en.to_string(),
        Locale::ZhTw => zh.to_string(),
    }
}

impl Message {
    /// Render the message in `locale`.
    pub fn render(&self, locale: Locale) -> String {
        use Locale::{En, ZhTw};

        match self {
            Self::AppTitle => pick(locale, "Mystic Oracle: Tarot Insights", "神秘神諭：塔羅洞察"),
            Self::AppSubtitle => pick(
                locale,
                "Explore the profound guidance of Tarot with AI wisdom.",
                "透過AI智慧，探索塔羅牌的深層指引。",
            ),
            Self::ErrorOccurred => pick(locale, "An Error Occurred", "發生錯誤"),
            Self::TryAgain => pick(locale, "Try Again", "重新開始"),
            Self::Loading => pick(locale, "Loading...", "正在載入..."),
            Self::GeneratingReading => pick(
                locale,
                "The AI is deeply analyzing your spread, please wait...",
                "AI 正在深度解析您的牌陣，請稍候...",
            ),
            Self::GeneratingReadingDefault => pick(
                locale,
                "Preparing your reading results...",
                "正在準備您的占卜結果...",
            ),
            Self::GeneratingImages => pick(locale, "Generating card images...", "正在生成卡牌圖像..."),
            Self::GeneratingOracle => pick(locale, "Generating Oracle's Insight...", "正在生成神諭..."),
            Self::OracleFailed => pick(locale, "Oracle's Insight generation failed.", "神諭生成失敗。"),
            Self::InterpretationFailed => pick(
                locale,
                "Interpretation failed, please try again later.",
                "解讀失敗，請稍後再試。",
            ),
            Self::PartialInterpretationOracleFailed => pick(
                locale,
                "Interpretation incomplete, cannot generate Oracle's Insight.",
                "解讀不完整，無法生成神諭。",
            ),
            Self::ErrorGetInterpretation => pick(
                locale,
                "Error fetching AI interpretation.",
                "獲取AI解讀時發生錯誤。",
            ),
            Self::InternalErrorRetry => pick(
                locale,
                "An internal error occurred. Please try again.",
                "發生內部錯誤，請重試。",
            ),
            Self::DownloadFailed => pick(locale, "Failed to download summary image.", "下載摘要圖片失敗。"),
            Self::DownloadNotReady => pick(
                locale,
                "Summary content is not ready yet, or no summary available for download.",
                "摘要內容尚未準備完成，或沒有可供下載的摘要。",
            ),
            Self::CredentialTitle => pick(locale, "Enter Your Gemini API Key", "輸入您的 Gemini API 金鑰"),
            Self::CredentialInstruction => pick(
                locale,
                "This key is used for the current session only and is never stored.",
                "此金鑰僅用於當前會話，不會以任何形式儲存。",
            ),
            Self::CredentialRequired => pick(locale, "API Key is required.", "API 金鑰為必填項。"),
            Self::EngineNotConfigured => pick(
                locale,
                "API Key not set or client initialization failed. Please go back and provide a valid API Key.",
                "API金鑰未設定或客戶端初始化失敗。請返回並提供有效的API金鑰。",
            ),
            Self::EngineCallFailed => pick(
                locale,
                "Error communicating with Gemini API. Please check your network connection and ensure your API Key is valid and has the necessary permissions.",
                "與 Gemini API 通訊時發生錯誤。請檢查您的網路連線，並確認 API 金鑰是否有效且具有所需權限。",
            ),
            Self::CredentialNote => pick(
                locale,
                "Your API Key is used only for the current session and is not stored or shared in any way.",
                "您的 API 金鑰僅用於當前會話，不會被儲存或共享。",
            ),
            Self::SelectSpreadTitle => pick(locale, "Select Spread Type", "選擇牌陣類型"),
            Self::SpreadCardCount { count } => match locale {
                En => format!("{count}-Card"),
                ZhTw => format!("{count}張牌"),
            },
            Self::TarotDisclaimer => pick(
                locale,
                "Tarot readings are for reference and self-exploration, not absolute predictions.",
                "塔羅牌占卜僅供參考與自我探索，並非絕對預測。",
            ),
            Self::QuestionTitle => pick(locale, "Enter Your Question", "輸入你的問題"),
            Self::QuestionPlaceholder => pick(
                locale,
                "e.g., What is the direction of my career path recently?",
                "例如：我最近的事業發展方向如何？",
            ),
            Self::QuestionRequired => pick(locale, "Please enter a question.", "請輸入你的問題。"),
            Self::GoBack => pick(locale, "Go Back", "返回上一步"),
            Self::CardNumberTitle => pick(locale, "Select Your Tarot Cards", "選擇你的塔羅牌"),
            Self::CardNumberInstruction { count } => match locale {
                En => format!(
                    "Please enter {count} different numbers (between 1 and 78) to select your cards."
                ),
                ZhTw => format!("請輸入 {count} 個不同的數字 (1 到 78 之間) 來選擇你的牌。"),
            },
            Self::CardLabel { index } => match locale {
                En => format!("Card {index}"),
                ZhTw => format!("第 {index} 張牌"),
            },
            Self::MissingNumber { position } => match locale {
                En => format!("Please enter a number for card {position}."),
                ZhTw => format!("請為第 {position} 張牌輸入一個數字。"),
            },
            Self::InvalidNumber { input, position } => match locale {
                En => format!(
                    "Number {input} is invalid. Please enter a number between 1 and 78 for card {position}."
                ),
                ZhTw => format!("數字 {input} 無效。請為第 {position} 張牌輸入1到78之間的數字。"),
            },
            Self::DuplicateNumber { number } => match locale {
                En => format!("Number {number} is duplicated. Please ensure all numbers are unique."),
                ZhTw => format!("數字 {number} 重複了。請確保所有數字都是唯一的。"),
            },
            Self::WrongCount { expected } => match locale {
                En => format!("Please enter exactly {expected} numbers."),
                ZhTw => format!("請輸入剛好 {expected} 個數字。"),
            },
            Self::ReadingTitle => pick(locale, "Your Tarot Reading", "你的塔羅牌解讀"),
            Self::YourQuestion => pick(locale, "Your Question:", "你的問題："),
            Self::SpreadLabel => pick(locale, "Spread:", "牌陣："),
            Self::DrawnCards => pick(locale, "Drawn Cards:", "抽到的牌："),
            Self::InterpretationLabel => pick(locale, "AI Comprehensive Interpretation:", "AI 綜合解讀："),
            Self::DownloadSummary => pick(locale, "Download Summary Card", "下載占卜摘要小卡"),
            Self::NewReading => pick(locale, "Start New Reading", "開始新的占卜"),
            Self::ImageGenerating => pick(locale, "Generating...", "生成中..."),
            Self::ImageFailed => pick(locale, "Image generating or failed", "圖像生成中或失敗"),
            Self::SummaryCardTitle => pick(locale, "Tarot Reading Summary", "塔羅占卜摘要"),
            Self::OracleLabel => pick(locale, "Oracle's Insight:", "神諭："),
            Self::SummaryCardFooter => pick(locale, "Mystic Oracle Tarot Insights", "神秘神諭塔羅洞察"),
            Self::SummarySaved { path } => match locale {
                En => format!("Summary card saved to {path}"),
                ZhTw => format!("摘要小卡已儲存至 {path}"),
            },
        }
    }

    /// Whether `text` is blank or equal to a placeholder/failure message in any
    /// locale, i.e. not genuine engine output.
    pub fn is_reserved(text: &str) -> bool {
        let text = text.trim();
        text.is_empty()
            || RESERVED
                .iter()
                .any(|m| Locale::all().iter().any(|l| m.render(*l) == text))
    }
}

impl From<&DrawError> for Message {
    fn from(err: &DrawError) -> Self {
        match err {
            DrawError::WrongCount { expected, .. } => Self::WrongCount {
                expected: *expected,
            },
            DrawError::MissingNumber { position } => Self::MissingNumber {
                position: *position,
            },
            DrawError::InvalidNumber { input, position } => Self::InvalidNumber {
                input: input.clone(),
                position: *position,
            },
            DrawError::DuplicateNumber { number } => Self::DuplicateNumber { number: *number },
        }
    }
}
