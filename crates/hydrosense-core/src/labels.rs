//! Localized display strings for the presentation layer.

use serde::Serialize;

use crate::types::{Language, Parameter, Potability};

/// Every user-facing string, in one language.
#[derive(Debug, Serialize)]
pub struct Labels {
    pub water_params: &'static str,
    pub ph: &'static str,
    pub hardness: &'static str,
    pub solids: &'static str,
    pub chloramines: &'static str,
    pub sulfate: &'static str,
    pub conductivity: &'static str,
    pub organic_carbon: &'static str,
    pub trihalomethanes: &'static str,
    pub turbidity: &'static str,
    pub analyze_btn: &'static str,
    pub expert_chat: &'static str,
    pub chat_placeholder: &'static str,
    pub success_title: &'static str,
    pub success_desc: &'static str,
    pub warning_title: &'static str,
    pub warning_desc: &'static str,
    pub unavailable_title: &'static str,
    pub settings: &'static str,
    pub clear_chat: &'static str,
    pub reset_params: &'static str,
    pub optimal_ranges: &'static str,
    pub analyze_first: &'static str,
    pub analyzing: &'static str,
}

static ENGLISH: Labels = Labels {
    water_params: "📊 Water Quality Parameters",
    ph: "pH",
    hardness: "Hardness (mg/L)",
    solids: "Total Dissolved Solids (ppm)",
    chloramines: "Chloramines (mg/L)",
    sulfate: "Sulfate (mg/L)",
    conductivity: "Conductivity (μS/cm)",
    organic_carbon: "Organic Carbon (mg/L)",
    trihalomethanes: "Trihalomethanes (μg/L)",
    turbidity: "Turbidity (NTU)",
    analyze_btn: "🔍 Analyze Water Quality",
    expert_chat: "💬 Water Expert Chat",
    chat_placeholder:
        "Ask about water quality improvements, crop recommendations, or treatment options...",
    success_title: "Water is Suitable for Irrigation",
    success_desc: "The water quality parameters indicate safe levels for agricultural use.",
    warning_title: "Water Needs Treatment",
    warning_desc: "Consider treatment before using for irrigation.",
    unavailable_title: "Prediction model is not loaded",
    settings: "⚙️ Settings",
    clear_chat: "Clear Chat",
    reset_params: "Reset Params",
    optimal_ranges: "📊 Optimal Ranges",
    analyze_first: "Please analyze water parameters first before starting the consultation.",
    analyzing: "Analyzing...",
};

static JAPANESE: Labels = Labels {
    water_params: "📊 水質パラメータ",
    ph: "pH",
    hardness: "硬度 (mg/L)",
    solids: "総溶解固形物 (ppm)",
    chloramines: "クロラミン (mg/L)",
    sulfate: "硫酸塩 (mg/L)",
    conductivity: "導電率 (μS/cm)",
    organic_carbon: "有機炭素 (mg/L)",
    trihalomethanes: "トリハロメタン (μg/L)",
    turbidity: "濁度 (NTU)",
    analyze_btn: "🔍 水質を分析する",
    expert_chat: "💬 水質専門家チャット",
    chat_placeholder: "水質改善、作物の推奨事項、または処理オプションについて質問してください...",
    success_title: "灌漑に適した水質です",
    success_desc: "水質パラメータは農業利用に安全なレベルを示しています。",
    warning_title: "水処理が必要です",
    warning_desc: "灌漑に使用する前に処理を検討してください。",
    unavailable_title: "予測モデルが読み込まれていません",
    settings: "⚙️ 設定",
    clear_chat: "チャットをクリア",
    reset_params: "パラメータをリセット",
    optimal_ranges: "📊 最適範囲",
    analyze_first: "相談を開始する前に、まず水質パラメータを分析してください。",
    analyzing: "分析中...",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::English => &ENGLISH,
            Language::Japanese => &JAPANESE,
        }
    }

    /// Form label, with unit, for a parameter.
    pub fn parameter(&self, parameter: Parameter) -> &'static str {
        match parameter {
            Parameter::Ph => self.ph,
            Parameter::Hardness => self.hardness,
            Parameter::Solids => self.solids,
            Parameter::Chloramines => self.chloramines,
            Parameter::Sulfate => self.sulfate,
            Parameter::Conductivity => self.conductivity,
            Parameter::OrganicCarbon => self.organic_carbon,
            Parameter::Trihalomethanes => self.trihalomethanes,
            Parameter::Turbidity => self.turbidity,
        }
    }

    /// Title and description for a prediction.
    pub fn verdict(&self, potability: Potability) -> (&'static str, &'static str) {
        match potability {
            Potability::Suitable => (self.success_title, self.success_desc),
            Potability::Unsuitable => (self.warning_title, self.warning_desc),
        }
    }
}
