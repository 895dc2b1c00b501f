use serde::{Deserialize, Serialize};

/// 文章目标语言
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "es")]
    Spanish,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::Japanese => write!(f, "ja"),
            TargetLanguage::Korean => write!(f, "ko"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::Spanish => write!(f, "es"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" | "英文" => Ok(TargetLanguage::English),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "ja" | "japanese" | "日本語" | "日文" => Ok(TargetLanguage::Japanese),
            "ko" | "korean" | "한국어" | "韩文" => Ok(TargetLanguage::Korean),
            "de" | "german" | "deutsch" | "德文" => Ok(TargetLanguage::German),
            "fr" | "french" | "français" | "法文" => Ok(TargetLanguage::French),
            "es" | "spanish" | "español" | "西班牙文" => Ok(TargetLanguage::Spanish),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Chinese => "中文",
            TargetLanguage::Japanese => "日本語",
            TargetLanguage::Korean => "한국어",
            TargetLanguage::German => "Deutsch",
            TargetLanguage::French => "Français",
            TargetLanguage::Spanish => "Español",
        }
    }

    /// 获取写作类阶段的语言指令，追加在系统提示词末尾
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::English => {
                "Write the article in English, keeping the language natural, precise and engaging."
            }
            TargetLanguage::Chinese => "请使用中文撰写文章，确保语言自然、准确、引人入胜。",
            TargetLanguage::Japanese => {
                "記事は日本語で執筆してください。自然で正確、かつ読者を引きつける表現を心がけてください。"
            }
            TargetLanguage::Korean => {
                "기사는 한국어로 작성해 주세요. 자연스럽고 정확하며 흥미로운 표현을 사용해 주세요."
            }
            TargetLanguage::German => {
                "Bitte schreiben Sie den Artikel auf Deutsch, in natürlicher, präziser und ansprechender Sprache."
            }
            TargetLanguage::French => {
                "Veuillez rédiger l'article en français, dans une langue naturelle, précise et engageante."
            }
            TargetLanguage::Spanish => {
                "Escribe el artículo en español, con un lenguaje natural, preciso y atractivo."
            }
        }
    }
}
