//! The flattened influencer record and its spreadsheet column mapping.
//!
//! The exports carry literal Korean column headers. Every converter variant
//! shares this one mapping definition instead of re-listing the columns per
//! input shape; columns a given export lacks simply resolve to `None`.

use serde::{Deserialize, Serialize};

use crate::format::format_count;
use crate::sheet::{Cell, Table};

/// Source column headers as they appear in the exports.
pub mod col {
    pub const ID: &str = "번호";
    pub const AUTHOR_NAME: &str = "작성자 이름";
    pub const ACCOUNT_ID: &str = "아이디(@계정)";
    pub const PROFILE_INTRO: &str = "프로필 소개글";
    pub const VIDEO_CAPTION: &str = "영상 설명(캡션)";
    pub const ENGAGEMENT_RATE: &str = "참여율";
    pub const VIEW_RATIO: &str = "조회수 비율";
    pub const COMMENT_CONVERSION: &str = "댓글 전환율";
    pub const FOLLOWER_QUALITY: &str = "팔로워 품질";
    pub const ESTIMATED_CPM: &str = "예상 CPM($)";
    pub const COST_EFFICIENCY: &str = "비용 효율";
    pub const FOLLOWER_COUNT: &str = "팔로워 수";
    pub const UPLOAD_COUNT: &str = "업로드 영상 수";
    pub const LIKES_COUNT: &str = "좋아요 수";
    pub const SHARES_COUNT: &str = "공유 수";
    pub const COMMENTS_COUNT: &str = "댓글 수";
    pub const VIEWS_COUNT: &str = "조회수";
    pub const VIDEO_DURATION: &str = "영상 길이(초)";
    pub const MUSIC_TITLE: &str = "음악 제목";
    pub const MUSIC_ARTIST: &str = "음악 아티스트";
    pub const UPLOAD_TIME: &str = "업로드 시간";
    pub const VIDEO_URL: &str = "영상 URL";
    pub const AUTHOR_ID: &str = "작성자 고유 ID";
    pub const THUMBNAIL_URL: &str = "영상 썸네일 URL";
    pub const FOLLOWER_TIER: &str = "팔로워 Tier";
    pub const EMAIL: &str = "이메일 추출";
    pub const PRIORITY: &str = "우선순위";
    pub const PROFILE_ENTRY: &str = "프로필 진입";
}

/// The upstream export marks absent emails with this label instead of
/// leaving the cell blank; it is normalized to `None` at mapping time.
pub const NO_EMAIL_SENTINEL: &str = "2.이메일 없음";

/// Which source a record came from when two exports are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfluencerType {
    Regular,
    Sales,
}

impl InfluencerType {
    pub fn as_str(self) -> &'static str {
        match self {
            InfluencerType::Regular => "regular",
            InfluencerType::Sales => "sales",
        }
    }
}

/// One influencer/post row, flattened for the dashboard viewer.
///
/// Every field is optional: missing cells, absent columns, and unparseable
/// numerics all surface as `None` (serialized as `null`). The trailing fields
/// only appear in the JSON when set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfluencerRecord {
    pub id: Option<u64>,
    pub author_name: Option<String>,
    pub account_id: Option<String>,
    pub profile_intro: Option<String>,
    pub video_caption: Option<String>,
    pub engagement_rate: Option<f64>,
    pub view_ratio: Option<f64>,
    pub comment_conversion: Option<f64>,
    pub follower_quality: Option<f64>,
    pub estimated_cpm: Option<f64>,
    pub cost_efficiency: Option<f64>,
    pub follower_count: Option<u64>,
    pub follower_count_formatted: Option<String>,
    pub upload_count: Option<u64>,
    pub likes_count: Option<u64>,
    pub likes_count_formatted: Option<String>,
    pub shares_count: Option<u64>,
    pub shares_count_formatted: Option<String>,
    pub comments_count: Option<u64>,
    pub comments_count_formatted: Option<String>,
    pub views_count: Option<u64>,
    pub views_count_formatted: Option<String>,
    pub video_duration: Option<f64>,
    pub music_title: Option<String>,
    pub music_artist: Option<String>,
    pub upload_time: Option<String>,
    pub video_url: Option<String>,
    pub author_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub follower_tier: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_entry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub influencer_type: Option<InfluencerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_thumbnail: Option<String>,
}

/// Column indices resolved once per loaded sheet. Columns the export does not
/// carry hold `None`.
#[derive(Debug)]
pub struct ColumnMap {
    id: Option<usize>,
    author_name: Option<usize>,
    account_id: Option<usize>,
    profile_intro: Option<usize>,
    video_caption: Option<usize>,
    engagement_rate: Option<usize>,
    view_ratio: Option<usize>,
    comment_conversion: Option<usize>,
    follower_quality: Option<usize>,
    estimated_cpm: Option<usize>,
    cost_efficiency: Option<usize>,
    follower_count: Option<usize>,
    upload_count: Option<usize>,
    likes_count: Option<usize>,
    shares_count: Option<usize>,
    comments_count: Option<usize>,
    views_count: Option<usize>,
    video_duration: Option<usize>,
    music_title: Option<usize>,
    music_artist: Option<usize>,
    upload_time: Option<usize>,
    video_url: Option<usize>,
    author_id: Option<usize>,
    thumbnail_url: Option<usize>,
    follower_tier: Option<usize>,
    email: Option<usize>,
    priority: Option<usize>,
    profile_entry: Option<usize>,
}

impl ColumnMap {
    pub fn resolve(table: &Table) -> ColumnMap {
        ColumnMap {
            id: table.column(col::ID),
            author_name: table.column(col::AUTHOR_NAME),
            account_id: table.column(col::ACCOUNT_ID),
            profile_intro: table.column(col::PROFILE_INTRO),
            video_caption: table.column(col::VIDEO_CAPTION),
            engagement_rate: table.column(col::ENGAGEMENT_RATE),
            view_ratio: table.column(col::VIEW_RATIO),
            comment_conversion: table.column(col::COMMENT_CONVERSION),
            follower_quality: table.column(col::FOLLOWER_QUALITY),
            estimated_cpm: table.column(col::ESTIMATED_CPM),
            cost_efficiency: table.column(col::COST_EFFICIENCY),
            follower_count: table.column(col::FOLLOWER_COUNT),
            upload_count: table.column(col::UPLOAD_COUNT),
            likes_count: table.column(col::LIKES_COUNT),
            shares_count: table.column(col::SHARES_COUNT),
            comments_count: table.column(col::COMMENTS_COUNT),
            views_count: table.column(col::VIEWS_COUNT),
            video_duration: table.column(col::VIDEO_DURATION),
            music_title: table.column(col::MUSIC_TITLE),
            music_artist: table.column(col::MUSIC_ARTIST),
            upload_time: table.column(col::UPLOAD_TIME),
            video_url: table.column(col::VIDEO_URL),
            author_id: table.column(col::AUTHOR_ID),
            thumbnail_url: table.column(col::THUMBNAIL_URL),
            follower_tier: table.column(col::FOLLOWER_TIER),
            email: table.column(col::EMAIL),
            priority: table.column(col::PRIORITY),
            profile_entry: table.column(col::PROFILE_ENTRY),
        }
    }

    /// Builds one record from a data row, tagging it with `kind` when the
    /// caller is combining multiple sources.
    pub fn record(&self, row: &[Cell], kind: Option<InfluencerType>) -> InfluencerRecord {
        let follower_count = self.count(row, self.follower_count);
        let likes_count = self.count(row, self.likes_count);
        let shares_count = self.count(row, self.shares_count);
        let comments_count = self.count(row, self.comments_count);
        let views_count = self.count(row, self.views_count);

        let email = self
            .text(row, self.email)
            .filter(|email| email != NO_EMAIL_SENTINEL);

        InfluencerRecord {
            id: self.count(row, self.id),
            author_name: self.text(row, self.author_name),
            account_id: self.text(row, self.account_id),
            profile_intro: self.text(row, self.profile_intro),
            video_caption: self.text(row, self.video_caption),
            engagement_rate: self.number(row, self.engagement_rate),
            view_ratio: self.number(row, self.view_ratio),
            comment_conversion: self.number(row, self.comment_conversion),
            follower_quality: self.number(row, self.follower_quality),
            estimated_cpm: self.number(row, self.estimated_cpm),
            cost_efficiency: self.number(row, self.cost_efficiency),
            follower_count_formatted: formatted(follower_count),
            follower_count,
            upload_count: self.count(row, self.upload_count),
            likes_count_formatted: formatted(likes_count),
            likes_count,
            shares_count_formatted: formatted(shares_count),
            shares_count,
            comments_count_formatted: formatted(comments_count),
            comments_count,
            views_count_formatted: formatted(views_count),
            views_count,
            video_duration: self.number(row, self.video_duration),
            music_title: self.text(row, self.music_title),
            music_artist: self.text(row, self.music_artist),
            upload_time: self.text(row, self.upload_time),
            video_url: self.text(row, self.video_url),
            author_id: self.text(row, self.author_id),
            thumbnail_url: self.text(row, self.thumbnail_url),
            follower_tier: self.text(row, self.follower_tier),
            email,
            priority: self.text(row, self.priority),
            profile_entry: self.text(row, self.profile_entry),
            influencer_type: kind,
            original_id: None,
            local_thumbnail: None,
        }
    }

    fn cell<'a>(&self, row: &'a [Cell], idx: Option<usize>) -> Option<&'a Cell> {
        idx.and_then(|i| row.get(i))
    }

    fn text(&self, row: &[Cell], idx: Option<usize>) -> Option<String> {
        self.cell(row, idx).and_then(|c| c.as_str())
    }

    fn number(&self, row: &[Cell], idx: Option<usize>) -> Option<f64> {
        self.cell(row, idx).and_then(|c| c.as_f64())
    }

    fn count(&self, row: &[Cell], idx: Option<usize>) -> Option<u64> {
        self.cell(row, idx).and_then(|c| c.as_u64())
    }
}

fn formatted(n: Option<u64>) -> Option<String> {
    n.and_then(|v| format_count(v as f64))
}
