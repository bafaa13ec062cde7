//! # Lexicon Module
//!
//! Every user-facing reply and operator-log phrase in one place. The log
//! phrases double as the legacy markers the analytics reconstructor looks
//! for, so changing them is a breaking change for historical reports.

// --- onboarding ---

pub const INTRO_TEXT: &str = "I'm your pocket plant expert: I can read a plant's condition, \
spot diseases and tell you how to help it grow faster and stronger.\n\n\
Let's check one of your plants right now.\n\
Send me a photo (good daylight works best) 👇";

pub const INTRO_BTN_SEND_PHOTO: &str = "📸 Send a photo";
pub const INTRO_BTN_DEMO: &str = "🚫 No plant around? Try the demo";

pub const DEMO_LEAD_IN: &str = "Let me show you what I can do on a real example. \
Here is a photo another user sent in!";

pub const DEMO_CASE_CAPTION: &str = "👀 Look at this tough case from yesterday.\n\n\
📸 Analysis complete.\n\
🌿 Patient: Zamioculcas zamiifolia (ZZ plant)\n\
📊 Health Score: 😕 6/10 (status: fair)\n\n\
Diagnosis:\n\
The upper leaves are yellowing and losing their shine, some look dried out, \
and the pale patches point to overwatering or not enough light. Early root \
rot is possible.\n\n\
⚠️ Prognosis:\n\
Watering without letting the soil dry will lead to mass leaf drop; the plant \
could die within 1-2 months.";

pub const DEMO_RECOVERY_CAPTION: &str =
    "And here it is after just one month of care with us!";

pub const DEMO_HOME_TIME_PROMPT: &str = "Tell me when you'll be home so you can send \
photos of your own plants.\n\nThen we can repeat this exercise on your plants 🌿";

pub const HOME_TIME_IN_2H: &str = "🏠 In 2 hours";
pub const HOME_TIME_IN_4H: &str = "🏠 In 4 hours";

pub const HOME_TIME_CONFIRMED: &str = "Great! I'll remind you in {hours} hours 😊";
pub const HOME_TIME_REPROMPT: &str =
    "Just tap one of the buttons so I know when to check in 🏠";

pub const REMINDER_TEXT: &str = "Hi! Are you home yet? 🌿\n\
We can start analyzing your plants — send me a photo 📸";
pub const REMINDER_BTN_HOME: &str = "✅ Yes, I'm home";

pub const ENTER_PHOTO_PROMPT: &str = "📎 Send me a photo of the plant 📸\n\
Good daylight and a close-up of a leaf work best 🌿";

pub const ALREADY_KNOWN: &str = "We already know each other 🌿\n\
Just ask a question or send a plant photo.";
pub const ALREADY_STARTED: &str = "We've already started 👀\n\
Keep going — I'm waiting for your answer or photo.";
pub const START_FIRST: &str = "Hit /start and I'll walk you through it 🌿";

// --- photo-waiting state ---

pub const WAITING_PHOTO_TEXT_REPLY: &str = "Right now I'm waiting for a plant photo 📸\n\
Just send a shot taken in daylight 🌿";
pub const WAITING_PHOTO_VOICE_REPLY: &str = "Got it 😊\n\
But for the analysis I need a photo of the plant 📸";
pub const PHOTO_ANALYSIS_FAILED: &str = "I couldn't analyze that photo 😔\n\
Try photographing the plant again in good daylight 📸";
pub const NOT_A_PLANT: &str = "I'm not sure that photo shows a plant 🌱\n\
Please send a photo of the plant itself 📸";
pub const SCORE_MISSING: &str = "I recognized the plant but I'm not confident about its \
condition 😔\nTry sending another photo in good light 📸";

pub const LEGACY_CITY_QUESTION: &str = "Hi! I'm your pocket plant expert 🌿\n\
First things first: what city are you in? I tune care advice to your climate.";
pub const PLAIN_WELCOME: &str = "Hi! I'm your pocket plant expert 🌿\n\
Ask me anything about your plants, or send a photo to talk it through.";

pub const CITY_PROMPT_RESCUE: &str = "⚠️ Looks like the plant needs help.\n\
So I can tailor the care plan to your climate, tell me your city 🌍";
pub const CITY_PROMPT_GROWTH: &str = "✅ Overall the plant is doing fine!\n\
So I can tailor the care plan to your climate, tell me your city 🌍";

// --- paywall screens ---

pub const RESCUE_SCREEN: &str = "⚠️ The situation is serious, but the plant can be saved.\n\n\
I've prepared an emergency 14-day recovery protocol for you:\n\
💧 a dry-watering schedule\n\
✂️ which roots to trim (with diagrams)\n\
💊 a list of cheap pharmacy remedies\n\n\
Grab the plan and save your plant 👇";

pub const GROWTH_SCREEN: &str = "🌿 The plant is in good shape!\n\n\
Want to switch it into active growth mode?\n\n\
✅ What you get:\n\
• smart reminders tuned to the weather in {city}\n\
• a feeding schedule for bigger leaves\n\
• alerts when humidity gets dangerous\n\n\
I can watch over the plant 24/7 👇";

pub const BTN_PAY_RESCUE: &str = "🚑 Start the treatment";
pub const BTN_PAY_RESCUE_ONCE: &str = "📄 One-time plan";
pub const BTN_PAY_GROWTH: &str = "🚀 Activate smart care";
pub const BTN_SKIP: &str = "🙅 Leave it as is";

pub const SKIP_MESSAGE: &str = "🌱 Dear friend,\n\n\
You have a few tries left.\n\
Ask me any question 💬 or send a plant photo 📸";

pub const PLAN_READY: &str = "Here is your detailed recovery plan 👇";
pub const PLAN_UNAVAILABLE: &str = "I couldn't find a recent diagnosis to build the plan \
from — send me a fresh photo first 📸";

// --- quota / subscription ---

pub const ACTION_LIMIT_EXCEEDED: &str = "You've used up your free questions 🌱\n\
Subscribe to keep chatting and get unlimited plant checks 👇";
pub const PHOTO_LIMIT_EXCEEDED: &str = "You've used all your photo analyses 📸\n\
Refresh the counter to keep checking your plants 👇";
pub const BTN_SUBSCRIBE_MONTH: &str = "🌿 1 month";
pub const BTN_SUBSCRIBE_YEAR: &str = "🌳 1 year";
pub const BTN_REFRESH_PICTURES: &str = "📸 Refresh photo limit";

pub const SUBSCRIPTION_SUCCESS: &str = "Subscription activated 🎉\n\
Ask me anything — I'm all yours.";
pub const REFRESH_PICTURES_SUCCESS: &str = "Photo counter refreshed 📸\n\
Send the next plant whenever you're ready!";

pub const SUPPORT_SUBSCRIBED: &str = "Your subscription is active 🌿\n\
Days left: {days}\nPhoto analyses left: {photos}";
pub const SUPPORT_UNSUBSCRIBED: &str = "You're on the free plan 🌱\n\
Free actions left: {actions}";
pub const SHARE_PROMPT: &str = "Pick the person you'd like to gift a subscription to 🎁\n\
Forward them this chat and they can start right away.";

// --- admin broadcast ---

pub const BROADCAST_DENIED: &str = "❌ You don't have broadcast permissions";
pub const BROADCAST_USAGE: &str = "Usage:\n/broadcast <message text>";
pub const BROADCAST_PHOTO_USAGE: &str =
    "Usage:\nreply to a message with a picture using /broadcast_photo";
pub const BROADCAST_NO_USERS: &str = "No users found";
pub const BROADCAST_DONE: &str = "📢 Broadcast finished\n\n\
👥 Users: {total}\n✅ Sent: {sent}\n❌ Failed: {failed}";

// --- errors ---

pub const MESSAGE_TOO_LONG: &str =
    "That message is a bit too long for me 😅 Try splitting it up.";
pub const MEDIA_GROUP_REJECTED: &str =
    "Please send one image at a time so I can answer properly.";
pub const AI_RATE_LIMITED: &str = "Request limits exceeded. Please try again later.";
pub const AI_GENERIC_ERROR: &str = "I couldn't get an answer just now 😔 \
Try rephrasing or send the message again in a minute.";
pub const AI_IMAGE_ERROR: &str = "Something went wrong processing the image. \
Make sure it's a regular photo (jpg, png) and try again.";
pub const UNEXPECTED_ERROR: &str =
    "Something unexpected went wrong. Please try again later.";

// --- operator log phrases ---
// The analytics reconstructor matches these as legacy markers.

pub const LOG_ACTION_LIMIT: &str = "action limit exceeded for user";
pub const LOG_PICTURES_LIMIT: &str = "picture limit exceeded for user";
pub const LOG_PAYMENT_SUCCESS: &str = "successful payment from user";
pub const LOG_DIAGNOSIS_RESULT: &str = "diagnosis delivered to user";

// --- AI prompt for the onboarding photo analysis ---

pub const PHOTO_ANALYSIS_PROMPT: &str = "The user sent their first plant photo. Act as a \
strict but caring plant doctor.\n\
Your job: analyze, alarm (if there is risk) or inspire (if all is well).\n\
Reply STRICTLY in this format:\n\
📸 Analysis complete.\n\
🌿 Patient: [Latin name] ([common name])\n\
📊 Health Score: [🔴/🟡/🟢] [number]/10 ([status: critical/fair/excellent])\n\
Diagnosis:\n\
[2-3 sentences. Describe the visible symptoms: spots, turgor, color. Name the \
likely cause.]\n\
⚠️ Prognosis:\n\
[What happens if nothing is done. Honest but dramatic.]\n\
(If the plant is healthy):\n\
Verdict: well done! But I see hidden potential. [Describe how it could grow \
better.]\n\
Write confidently and warmly, no apologies or extra explanations.\n\
At the VERY END add STRICTLY these lines (no commentary):\n\
PLANT: YES or NO\n\
QUALITY: GOOD or BAD";

pub const DIALOG_IMAGE_PROMPT: &str = "The user sent an image without extra text. \
Describe what is in the image and answer with the current dialog context in mind.";
