// ABOUTME: User-facing message strings surfaced by the HTTP API
// ABOUTME: Friendly Chinese copy shown by the journaling client on success and failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Caller is not authenticated
pub const NOT_LOGGED_IN: &str = "用户未登录";
/// Chat body failed validation
pub const INVALID_MESSAGE_FORMAT: &str = "无效的消息格式";
/// Final chat turn is not a user message
pub const LAST_MESSAGE_NOT_USER: &str = "最后一条消息必须来自用户";
/// Final chat turn is blank
pub const EMPTY_MESSAGE: &str = "消息内容不能为空";
/// Generic internal failure, never carries detail
pub const INTERNAL_ERROR: &str = "服务器内部错误";
/// Chat liveness probe message
pub const CHAT_SERVICE_RUNNING: &str = "AI聊天服务运行中";

/// Upstream rejected our API key
pub const AI_AUTH_FAILED: &str = "API认证失败，请检查API密钥";
/// Upstream rate limit hit
pub const AI_RATE_LIMITED: &str = "API调用频率过高，请稍后重试";
/// Upstream call timed out
pub const AI_TIMEOUT: &str = "API请求超时，请稍后重试";
/// Any other upstream failure
pub const AI_UNAVAILABLE: &str = "AI服务暂时不可用，请稍后重试";
/// No AI API key configured
pub const AI_KEY_MISSING: &str = "DeepSeek API Key未配置";

/// Note type or content missing
pub const NOTE_FIELDS_REQUIRED: &str = "类型和内容不能为空";
/// Note type outside the fixed set
pub const NOTE_TYPE_INVALID: &str = "无效的纸条类型";
/// Note insert failed
pub const NOTE_CREATE_FAILED: &str = "创建纸条失败";
/// Prefix applied to note creation failures
pub const NOTE_CREATE_FAILED_PREFIX: &str = "创建失败: ";
/// Note not found for this user
pub const NOTE_NOT_FOUND: &str = "纸条不存在";
/// generate-ai-reply called without a note id
pub const NOTE_ID_REQUIRED: &str = "笔记ID不能为空";

/// Login with blank fields
pub const LOGIN_FIELDS_REQUIRED: &str = "邮箱和密码不能为空";
/// Login rejected by the auth provider
pub const LOGIN_INVALID_CREDENTIALS: &str = "邮箱或密码错误";
/// Profile row could not be created
pub const LOGIN_PROFILE_FAILED: &str = "创建用户记录失败";
/// Login succeeded
pub const LOGIN_SUCCESS: &str = "登录成功";
/// Logout succeeded
pub const LOGOUT_SUCCESS: &str = "已退出登录";

/// Store reachable
pub const HEALTH_OK: &str = "Supabase连接正常";
/// Store unreachable
pub const HEALTH_FAILED: &str = "Supabase连接失败";
/// Supabase URL or key not configured
pub const SUPABASE_NOT_CONFIGURED: &str = "Supabase配置未找到";
