//! Conversion options.
//!
//! Options deserialize from camelCase JSON so a host can pass them straight
//! through; every field has a default matching the Taro runtime.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

lazy_static::lazy_static! {
    /// Components exported by the UI component library.
    pub static ref KNOWN_COMPONENTS: BTreeSet<&'static str> = {
        let mut s = BTreeSet::new();
        // View containers
        s.insert("View");
        s.insert("ScrollView");
        s.insert("Swiper");
        s.insert("SwiperItem");
        s.insert("MovableArea");
        s.insert("MovableView");
        s.insert("CoverView");
        s.insert("CoverImage");
        s.insert("Block");

        // Basic content
        s.insert("Icon");
        s.insert("Text");
        s.insert("RichText");
        s.insert("Progress");

        // Forms
        s.insert("Button");
        s.insert("Checkbox");
        s.insert("CheckboxGroup");
        s.insert("Form");
        s.insert("Input");
        s.insert("Label");
        s.insert("Picker");
        s.insert("PickerView");
        s.insert("PickerViewColumn");
        s.insert("Radio");
        s.insert("RadioGroup");
        s.insert("Slider");
        s.insert("Switch");
        s.insert("Textarea");

        // Navigation and media
        s.insert("Navigator");
        s.insert("FunctionalPageNavigator");
        s.insert("Audio");
        s.insert("Image");
        s.insert("Video");
        s.insert("Camera");
        s.insert("LivePlayer");
        s.insert("LivePusher");

        // Map, canvas and open capabilities
        s.insert("Map");
        s.insert("Canvas");
        s.insert("OpenData");
        s.insert("WebView");
        s.insert("Ad");
        s.insert("OfficialAccount");
        s.insert("Editor");
        s
    };
}

/// Maps mini-program lifecycle hooks to class component lifecycle methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LifecycleTable(BTreeMap<String, String>);

impl LifecycleTable {
    pub fn get(&self, hook: &str) -> Option<&str> {
        self.0.get(hook).map(String::as_str)
    }

    pub fn insert(&mut self, hook: impl Into<String>, method: impl Into<String>) {
        self.0.insert(hook.into(), method.into());
    }
}

impl Default for LifecycleTable {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert("onLoad".to_string(), "componentWillMount".to_string());
        table.insert("onShow".to_string(), "componentDidShow".to_string());
        table.insert("onReady".to_string(), "componentDidMount".to_string());
        table.insert("onHide".to_string(), "componentDidHide".to_string());
        table.insert("onUnload".to_string(), "componentWillUnmount".to_string());
        Self(table)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Global namespace of the source framework (`wx.request(...)`).
    pub legacy_namespace: String,
    /// Namespace the rewritten script and the class superclass live under.
    pub target_namespace: String,
    /// Bare global calls that move under the target namespace.
    pub app_globals: Vec<String>,
    pub components_source: String,
    pub framework_source: String,
    pub decorator_helper: String,
    pub decorator_source: String,
    /// Class name for `Page` and `Component` definitions.
    pub default_class_name: String,
    /// Attribute `wx:key` is renamed to inside a loop.
    pub key_attribute: String,
    /// Run `key_attribute` through attribute key normalization.
    pub normalize_key_attribute: bool,
    /// `None` calls the collection directly (`list(cb)`); `Some("map")`
    /// produces `list.map(cb)`.
    pub loop_method: Option<String>,
    pub lifecycle: LifecycleTable,
    pub known_components: BTreeSet<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            legacy_namespace: "wx".to_string(),
            target_namespace: "Taro".to_string(),
            app_globals: vec!["getApp".to_string(), "getCurrentPages".to_string()],
            components_source: "@tarojs/components".to_string(),
            framework_source: "@tarojs/taro".to_string(),
            decorator_helper: "withWeapp".to_string(),
            decorator_source: "@tarojs/with-weapp".to_string(),
            default_class_name: "_C".to_string(),
            key_attribute: "key".to_string(),
            normalize_key_attribute: false,
            loop_method: None,
            lifecycle: LifecycleTable::default(),
            known_components: KNOWN_COMPONENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TransformOptions {
    pub fn is_known_component(&self, tag: &str) -> bool {
        self.known_components.contains(tag)
    }
}
